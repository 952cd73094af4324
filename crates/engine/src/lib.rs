pub use commands::{
    DonationListFilter, DonationNewCmd, DonationUpdateCmd, OnboardingCmd, ProgramListFilter,
    ProgramNewCmd, ProgramUpdateCmd, RegisterProfileCmd, UserUpdateCmd, VolunteerListFilter,
    VolunteerNewCmd, VolunteerUpdateCmd,
};
pub use donations::{Donation, DonationStatus};
pub use error::EngineError;
pub use identity::{HttpIdentity, IdentityError, IdentityProvider, MemoryIdentity, Session};
pub use money::MoneyCents;
pub use ops::reports::{
    DashboardSummary, CategorySlice, DonationReportRow, DonationsReport, ProgramReportRow,
    ReportRange, VolunteerReportRow,
};
pub use ops::{DonationFeed, Engine, EngineBuilder};
pub use programs::{Program, ProgramStatus};
pub use store::local::LocalStore;
pub use store::{
    ChangeEvent, ChangeKind, DocumentStore, Query, SortOrder, StoreError, StoreTransaction,
};
pub use users::{UserProfile, UserRole};
pub use volunteers::{Volunteer, VolunteerStatus};

mod commands;
mod donations;
mod error;
mod identity;
mod money;
mod ops;
mod programs;
mod store;
mod users;
mod util;
mod volunteers;

type ResultEngine<T> = Result<T, EngineError>;

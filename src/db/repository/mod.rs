pub mod event;
pub mod planning;
pub mod user;

pub use event::EventRepository;
pub use planning::PlanningRepository;
pub use user::UserRepository;

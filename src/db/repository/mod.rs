pub mod assignment;
pub mod day;
pub mod mic_group;
pub mod presenter_slot;
pub mod session;

pub use assignment::AssignmentRepository;
pub use day::DayRepository;
pub use mic_group::MicGroupRepository;
pub use presenter_slot::PresenterSlotRepository;
pub use session::SessionRepository;

pub mod activity;
pub mod signup;

pub use activity::ActivityRecord;
pub use signup::{
    BannerKind, CapacitySnapshot, ControlPhase, MessageBanner, SignupControlState, SignupForm,
};

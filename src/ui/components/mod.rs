pub mod modal;
pub mod progress_bar;
pub mod toast;

pub use modal::*;
pub use progress_bar::*;
pub use toast::*;

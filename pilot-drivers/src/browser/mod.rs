//! Browser-backed collaborators built on `fantoccini`.
mod session;

pub use session::{chrome_arguments, WebDriverSession, WebDriverSettings};

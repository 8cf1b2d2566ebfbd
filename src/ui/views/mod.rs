mod gallery;
mod registration;

pub use gallery::GalleryView;
pub use registration::RegistrationView;

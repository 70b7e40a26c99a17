mod store;

pub use store::{fit_dimensions, MediaObject, MediaStore};

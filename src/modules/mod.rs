//! Modules layer - infrastructure components external to the domain features.

pub mod media;

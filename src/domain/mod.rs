pub mod composer;
pub mod input;
pub mod selection;
pub mod timing;

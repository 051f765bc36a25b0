pub mod consistency;
pub mod copy;
pub mod correction;
pub mod curate;
pub mod info;
pub mod package;
pub mod params;
pub mod parse;
pub mod populate;
pub mod validate;

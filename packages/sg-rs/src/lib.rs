pub mod bids;
pub mod consistency;
pub mod correction;
pub mod curate;
pub mod derivatives;
pub mod error;
pub mod grammar;
pub mod name;
pub mod naming;
pub mod package;
pub mod params;
pub mod tools;
pub mod validator;

pub use bids::{get_contrast, get_subject, infer_datatype, Datatype};
pub use error::{Result, SgError};
pub use name::{BidsName, Entity};
pub use naming::{add_suffix, remove_suffix, split_extension};
pub use validator::{validate_dataset, ValidationReport};

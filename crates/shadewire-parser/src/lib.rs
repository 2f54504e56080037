//! WGSL front-end for shadewire, backed by naga.
//!
//! Generated modules are checked with [naga](https://crates.io/crates/naga)'s
//! WGSL parser and validator. The struct layouts naga computes can be read
//! back for comparison with the layout engine, and struct declarations can
//! be imported as [`Schema`](shadewire_schema::Schema) values.

mod import;

pub use import::{StructLayout, import_structs, struct_layouts};

/// Parse WGSL source into a naga module without validating it.
pub fn parse(source: &str) -> Result<naga::Module, ParseError> {
    Ok(naga::front::wgsl::parse_str(source)?)
}

/// Parse and fully validate WGSL source, with every capability allowed.
pub fn validate(source: &str) -> Result<naga::Module, ParseError> {
    let module = parse(source)?;
    naga::valid::Validator::new(
        naga::valid::ValidationFlags::all(),
        naga::valid::Capabilities::all(),
    )
    .validate(&module)
    .map_err(|e| ParseError::Validation(e.into_inner().to_string()))?;
    Ok(module)
}

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error(transparent)]
    Wgsl(#[from] naga::front::wgsl::ParseError),
    #[error("validation: {0}")]
    Validation(String),
    #[error("layout: {0}")]
    Layout(String),
    #[error("unsupported: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Schema(#[from] shadewire_schema::SchemaError),
}

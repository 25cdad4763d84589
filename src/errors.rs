// Copyright Catenary Transit Initiatives
//! Error types shared by the resolution pipeline.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeometryError {
    #[error("catenary constant must be finite and positive, got {0}")]
    InvalidConstant(f64),
    #[error("non-finite coordinate in {context}: lng={lng}, lat={lat}, alt={alt}")]
    NonFiniteCoordinate {
        context: &'static str,
        lng: f64,
        lat: f64,
        alt: f64,
    },
    #[error("tower '{tower_id}' has no usable position (lat={lat}, lng={lng})")]
    MissingCoordinates { tower_id: String, lat: f64, lng: f64 },
    #[error("tower '{tower_id}' has an invalid height {height}")]
    InvalidHeight { tower_id: String, height: f64 },
    #[error("catenary sag overflowed for span length {span_m} m and constant {constant}")]
    SagOverflow { span_m: f64, constant: f64 },
    #[error("span '{span_id}' references unknown tower '{reference}'")]
    MissingTowerReference { span_id: String, reference: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error reading '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid configuration JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type GeometryResult<T> = Result<T, GeometryError>;

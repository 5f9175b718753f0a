//! Core business logic: conversion formulas and exchange rate state

pub mod config;
pub mod convert;
pub mod error;
pub mod log;
pub mod rate;

// Re-export main types for cleaner imports
pub use convert::{Conversion, ConversionDirection, ConversionMode, Converter, Unit};
pub use error::{ConvertError, FetchError};
pub use rate::{ExchangeRate, QuoteSource, RateProvider, RateStatus};

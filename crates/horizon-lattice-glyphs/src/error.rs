//! Error types for the glyphs crate.

use thiserror::Error;

use crate::types::GlyphId;

/// Errors reported by a [`GlyphRangeFetcher`](crate::GlyphRangeFetcher).
///
/// A fetch either produces a whole range or a single error; partial data is
/// never returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// The request could not be sent or the response body could not be read.
    #[error("glyph request failed: {0}")]
    Request(String),

    /// The glyph service answered with a non-success status.
    #[error("glyph service returned HTTP {status}")]
    HttpStatus {
        /// The HTTP status code.
        status: u16,
    },

    /// The response body was not a valid glyph payload.
    #[error("invalid glyph data: {0}")]
    Decode(String),
}

/// Errors that can occur while provisioning glyphs.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GlyphError {
    /// The glyph id falls in a range beyond the supported ceiling.
    #[error("glyph id {id} is not supported (ranges above {max} are unavailable)")]
    UnsupportedCodepoint {
        /// The rejected glyph id.
        id: GlyphId,
        /// Highest glyph id the remote service can serve.
        max: GlyphId,
    },

    /// A remote fetch was required but no glyph service URL is set.
    #[error("glyph service URL is not set")]
    NoServiceConfigured,

    /// The remote fetch for a range failed.
    #[error("failed to load glyph range {range} for font stack '{stack}': {source}")]
    FetchFailed {
        /// Font stack the range was requested for.
        stack: String,
        /// Range index (`codepoint / 256`).
        range: u32,
        /// The error reported by the fetcher.
        #[source]
        source: FetchError,
    },

    /// The fetch task for a range ended without delivering a result.
    #[error("glyph range {range} for font stack '{stack}' was abandoned before completing")]
    FetchAborted {
        /// Font stack the range was requested for.
        stack: String,
        /// Range index (`codepoint / 256`).
        range: u32,
    },

    /// Local synthesis was requested but no local font family or rasterizer is configured.
    #[error("local glyph synthesis is not configured")]
    SynthesisUnavailable,
}

/// Result type for glyph operations.
pub type GlyphResult<T> = Result<T, GlyphError>;

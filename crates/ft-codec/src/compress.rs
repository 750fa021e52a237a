//! Text compression ahead of encryption
//!
//! The codec is a fixed identifier agreed out of band (see `CodecConfig`); the
//! compressed bytes carry no marker of their own besides the codec's native
//! header. Default is a zlib-framed deflate stream.

use std::fmt;
use std::io::{Read, Write};
use std::str::FromStr;

use flate2::read::{GzDecoder, ZlibDecoder};
use flate2::write::{GzEncoder, ZlibEncoder};
use flate2::Compression;
use ft_core::config::CodecConfig;
use ft_core::CompressionError;

/// Default ceiling on decompressed output: 16 MiB
pub const DEFAULT_MAX_DECOMPRESSED: usize = 16 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompressionCodec {
    /// zlib-framed deflate
    #[default]
    Deflate,
    /// gzip-framed deflate
    Gzip,
    Zstd,
}

impl CompressionCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deflate => "deflate",
            Self::Gzip => "gzip",
            Self::Zstd => "zstd",
        }
    }
}

impl fmt::Display for CompressionCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CompressionCodec {
    type Err = CompressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "deflate" => Ok(Self::Deflate),
            "gzip" => Ok(Self::Gzip),
            "zstd" => Ok(Self::Zstd),
            other => Err(CompressionError::UnknownCodec(other.to_string())),
        }
    }
}

/// A configured compressor: codec, level, and output ceiling.
#[derive(Debug, Clone)]
pub struct Compressor {
    codec: CompressionCodec,
    level: u32,
    max_decompressed: usize,
}

impl Default for Compressor {
    fn default() -> Self {
        Self::new(CompressionCodec::Deflate, 6, DEFAULT_MAX_DECOMPRESSED)
    }
}

impl Compressor {
    pub fn new(codec: CompressionCodec, level: u32, max_decompressed: usize) -> Self {
        Self {
            codec,
            level,
            max_decompressed,
        }
    }

    pub fn from_config(config: &CodecConfig) -> Result<Self, CompressionError> {
        let codec = config.compression.parse()?;
        Ok(Self::new(codec, config.level, config.max_decompressed_bytes))
    }

    pub fn codec(&self) -> CompressionCodec {
        self.codec
    }

    /// Compress UTF-8 text.
    pub fn compress(&self, text: &str) -> Result<Vec<u8>, CompressionError> {
        let input = text.as_bytes();
        let out = match self.codec {
            CompressionCodec::Deflate => {
                let mut enc = ZlibEncoder::new(Vec::new(), Compression::new(self.level.min(9)));
                enc.write_all(input).map_err(encode_err)?;
                enc.finish().map_err(encode_err)?
            }
            CompressionCodec::Gzip => {
                let mut enc = GzEncoder::new(Vec::new(), Compression::new(self.level.min(9)));
                enc.write_all(input).map_err(encode_err)?;
                enc.finish().map_err(encode_err)?
            }
            CompressionCodec::Zstd => {
                let level = self.level.clamp(1, 22) as i32;
                zstd::encode_all(input, level).map_err(encode_err)?
            }
        };
        tracing::debug!(
            codec = %self.codec,
            plain = input.len(),
            compressed = out.len(),
            "compressed payload"
        );
        Ok(out)
    }

    /// Decompress back to UTF-8 text.
    ///
    /// Corrupt input, output over the configured ceiling, and output that is
    /// not UTF-8 all fail with `CorruptStream`.
    pub fn decompress(&self, bytes: &[u8]) -> Result<String, CompressionError> {
        let out = match self.codec {
            CompressionCodec::Deflate => self.read_bounded(ZlibDecoder::new(bytes))?,
            CompressionCodec::Gzip => self.read_bounded(GzDecoder::new(bytes))?,
            CompressionCodec::Zstd => {
                let dec = zstd::stream::read::Decoder::new(bytes).map_err(corrupt)?;
                self.read_bounded(dec)?
            }
        };
        String::from_utf8(out)
            .map_err(|e| CompressionError::CorruptStream(format!("not UTF-8: {e}")))
    }

    fn read_bounded<R: Read>(&self, reader: R) -> Result<Vec<u8>, CompressionError> {
        let mut out = Vec::new();
        reader
            .take((self.max_decompressed as u64).saturating_add(1))
            .read_to_end(&mut out)
            .map_err(corrupt)?;
        if out.len() > self.max_decompressed {
            return Err(CompressionError::CorruptStream(format!(
                "decompressed payload exceeds {} bytes",
                self.max_decompressed
            )));
        }
        Ok(out)
    }
}

fn encode_err(e: std::io::Error) -> CompressionError {
    CompressionError::Encode(e.to_string())
}

fn corrupt(e: std::io::Error) -> CompressionError {
    CompressionError::CorruptStream(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const ALL: [CompressionCodec; 3] = [
        CompressionCodec::Deflate,
        CompressionCodec::Gzip,
        CompressionCodec::Zstd,
    ];

    #[test]
    fn round_trip_each_codec() {
        let text = r#"{"users":{},"posts":{},"rootPostIds":[]} ünïcødé ✓"#;
        for codec in ALL {
            let c = Compressor::new(codec, 6, DEFAULT_MAX_DECOMPRESSED);
            let packed = c.compress(text).unwrap();
            assert_eq!(c.decompress(&packed).unwrap(), text, "codec {codec}");
        }
    }

    #[test]
    fn round_trip_empty() {
        let c = Compressor::default();
        let packed = c.compress("").unwrap();
        assert_eq!(c.decompress(&packed).unwrap(), "");
    }

    #[test]
    fn repetitive_text_shrinks() {
        let text = "hello thread ".repeat(500);
        let packed = Compressor::default().compress(&text).unwrap();
        assert!(packed.len() < text.len() / 10);
    }

    #[test]
    fn garbage_is_corrupt_stream() {
        for codec in ALL {
            let c = Compressor::new(codec, 6, DEFAULT_MAX_DECOMPRESSED);
            let err = c.decompress(b"not a compressed stream at all").unwrap_err();
            assert!(
                matches!(err, CompressionError::CorruptStream(_)),
                "codec {codec}: {err:?}"
            );
        }
    }

    #[test]
    fn non_utf8_payload_is_corrupt_stream() {
        let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
        enc.write_all(&[0xff, 0xfe, 0xfd]).unwrap();
        let packed = enc.finish().unwrap();

        let err = Compressor::default().decompress(&packed).unwrap_err();
        assert!(matches!(err, CompressionError::CorruptStream(_)));
    }

    #[test]
    fn output_ceiling_enforced() {
        let text = "a".repeat(4096);
        let c = Compressor::new(CompressionCodec::Deflate, 6, 1024);
        let packed = c.compress(&text).unwrap();
        let err = c.decompress(&packed).unwrap_err();
        assert!(matches!(err, CompressionError::CorruptStream(_)));
    }

    #[test]
    fn unbounded_ceiling_still_decompresses() {
        let c = Compressor::new(CompressionCodec::Deflate, 6, usize::MAX);
        let packed = c.compress("no ceiling").unwrap();
        assert_eq!(c.decompress(&packed).unwrap(), "no ceiling");
    }

    #[test]
    fn codec_parsing() {
        assert_eq!("deflate".parse::<CompressionCodec>().unwrap(), CompressionCodec::Deflate);
        assert_eq!(" ZSTD ".parse::<CompressionCodec>().unwrap(), CompressionCodec::Zstd);
        assert_eq!(
            "brotli".parse::<CompressionCodec>().unwrap_err(),
            CompressionError::UnknownCodec("brotli".into())
        );
    }

    #[test]
    fn from_config_uses_settings() {
        let config = CodecConfig {
            compression: "gzip".into(),
            level: 9,
            max_decompressed_bytes: 64,
        };
        let c = Compressor::from_config(&config).unwrap();
        assert_eq!(c.codec(), CompressionCodec::Gzip);
        assert!(c.decompress(&c.compress(&"x".repeat(65)).unwrap()).is_err());
    }

    proptest! {
        #[test]
        fn deflate_roundtrip(text in ".{0,2048}") {
            let c = Compressor::default();
            let packed = c.compress(&text).unwrap();
            prop_assert_eq!(c.decompress(&packed).unwrap(), text);
        }
    }
}

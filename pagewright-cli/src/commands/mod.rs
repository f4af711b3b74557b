//! CLI command implementations

mod batch;
mod convert;
mod info;
mod validate;

pub use batch::batch;
pub use convert::{convert, ConvertArgs};
pub use info::info;
pub use validate::validate;

use anyhow::{Context, Result};
use clap::Args;
use pagewright_core::ConversionOptions;

/// Conversion options shared by `convert` and `batch`
#[derive(Args, Debug, Clone, Default)]
pub struct OptionArgs {
    /// JSON file with conversion options
    #[arg(short, long)]
    pub config: Option<String>,

    /// Book title
    #[arg(long)]
    pub title: Option<String>,

    /// Book author
    #[arg(long)]
    pub author: Option<String>,

    /// Language code
    #[arg(long)]
    pub language: Option<String>,

    /// Skip rendering page images
    #[arg(long)]
    pub no_images: bool,

    /// Width of rendered page images in pixels
    #[arg(long)]
    pub image_width: Option<u32>,
}

impl OptionArgs {
    /// Load the config file, if any, then apply flag overrides
    pub fn resolve(&self) -> Result<ConversionOptions> {
        let mut options = load_options(self.config.as_deref())?;

        if let Some(title) = &self.title {
            options.title = Some(title.clone());
        }
        if let Some(author) = &self.author {
            options.author = Some(author.clone());
        }
        if let Some(language) = &self.language {
            options.language = language.clone();
        }
        if self.no_images {
            options.render_images = false;
        }
        if let Some(width) = self.image_width {
            options.image_width = width;
        }

        options.validate().context("Invalid conversion options")?;
        Ok(options)
    }
}

/// Read options from a JSON file, or use the defaults
pub fn load_options(config: Option<&str>) -> Result<ConversionOptions> {
    match config {
        Some(path) => ConversionOptions::from_json_file(path)
            .with_context(|| format!("Failed to load config file: {}", path)),
        None => Ok(ConversionOptions::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let args = OptionArgs {
            title: Some("Override".to_string()),
            language: Some("fr".to_string()),
            no_images: true,
            ..Default::default()
        };
        let options = args.resolve().unwrap();
        assert_eq!(options.title.as_deref(), Some("Override"));
        assert_eq!(options.language, "fr");
        assert!(!options.render_images);
        assert_eq!(options.author, None);
    }

    #[test]
    fn test_zero_width_rejected() {
        let args = OptionArgs {
            image_width: Some(0),
            ..Default::default()
        };
        assert!(args.resolve().is_err());
    }
}

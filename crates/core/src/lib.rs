pub mod config;
pub mod error;
pub mod fetch;
pub mod ids;
pub mod model;
pub mod parse;
pub mod reader;
pub mod source;
pub mod strategy;

pub use config::{Settings, SettingsLoader};
pub use error::{Result, TankobonError};
pub use fetch::{FetchConfig, FetchConfigBuilder, Transport};
pub use fetch::{fetch_file, fetch_stdin};
pub use ids::{IdScheme, NumberFallback};
pub use model::{Chapter, Manga, MangaDetails, PageEntry, SourceInfo};
pub use parse::{Document, Element};
pub use reader::{MangaInfo, ReaderContext, load_chapter};
pub use source::{AsuraSource, MangaLifeSource, MangaSource, ManhuaFastSource, SourceRegistry};
pub use source::{Extracted, PageKind};

pub mod change;
#[cfg(feature = "cli")]
pub mod cli;
pub mod cloud_dump;
pub mod config;
pub mod error;
pub mod host;
pub mod layout;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod render;
pub mod selection;
pub mod source;
pub mod text_metrics;
pub mod theme;

pub use change::{ChangeDetector, ChangeSignature, PassKind, WatchedField, WatchedInputs};
#[cfg(feature = "cli")]
pub use cli::run;
pub use config::{CloudSettings, Config, DEFAULT_SEED, load_config};
pub use error::CloudError;
pub use hit_test::HitTester;
pub use host::{Host, LogHost, RecordingHost};
pub use layout::{LayoutEngine, LayoutJob, RotationMode, SpiralLayout};
pub use model::{CanvasSize, MarkMode, PlacedWord, Word};
pub use normalize::{FontScale, FontSizeNormalizer};
pub use pipeline::{PassOutcome, RenderInputs, RenderPipeline, RenderedCloud};
pub use render::render_svg;
pub use selection::{HighlightOverlay, PointerEvent, SelectionController, SelectionSignal};
pub use source::{DataRow, DataSource, RowSet};
pub use theme::Theme;

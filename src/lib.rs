pub mod ticker;
pub mod price_matrix;
pub mod classification;
pub mod yahoo_finance;
pub mod analytics;
pub mod graph;
pub mod pipeline;
pub mod config;
pub mod report;


pub use ticker::{Ticker, TickerError};
pub use price_matrix::{
    CsvPriceSource, DailyBar, DateRange, InMemoryPriceSource, PriceField, PriceMatrix, PriceMatrixError,
    PriceSource, PriceSourceError,
};
pub use classification::{
    Classification, ClassificationError, ClassificationMap, ClassificationSource,
    CsvClassificationSource,
};
pub use yahoo_finance::{DownloadError, DownloaderConfig, YahooFinanceDownloader};
pub use analytics::{
    compute_correlation, generate_windows, CorrelationMatrix, TimeWindow, WindowError, WindowSkip,
};
pub use graph::{
    compute_node_centralities, compute_window_metrics, to_graph, to_pos_neg_graphs,
    CorrelationGraph, GraphError, GraphInfo, GraphKind, NodeCentrality, PosNegGraphPair,
    WindowMetrics,
};
pub use pipeline::{
    AnalysisError, AnalysisReport, CentralityRow, CentralitySeries, GraphMode,
    RollingGraphAnalysis, TickerSeries, WindowStatsRow,
};
pub use config::{AnalysisConfig, ConfigError};
pub use report::ReportError;

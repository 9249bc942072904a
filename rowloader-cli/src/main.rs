//! rowloader: imports Excel / CSV files into a remote object service
//!
//! The binary is a thin shell around the import and upload pipeline: it
//! wraps the input file the way the hosting shell would, parses it into a
//! table and delivers the rows to the configured target object.

mod api;
mod import;
mod upload;

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use colored::{ColoredString, Colorize};

use api::ObjectServiceClient;
use import::{
    CsvImportSettings, CsvImporter, ExcelImportSettings, ExcelImporter, ImportStatus, Importer,
    SpaceMode, envelope,
};
use upload::{UploadSettings, UploadStatus, Uploader};

#[derive(Parser)]
#[command(
    name = "rowloader-cli",
    about = "Import Excel / CSV data into a remote object service",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Import a delimited text file
    Csv {
        /// File to import
        file: PathBuf,
        /// Field delimiter
        #[arg(long, default_value_t = ',')]
        delimiter: char,
        /// Qualifier around fields containing the delimiter
        #[arg(long, default_value_t = '"')]
        qualifier: char,
        /// Header space handling: replace (spaces become underscores) or remove
        #[arg(long, default_value = "remove")]
        header_spaces: SpaceMode,
        #[command(flatten)]
        target: TargetArgs,
    },
    /// Import a worksheet from an Excel workbook
    Excel {
        /// File to import
        file: PathBuf,
        /// Worksheet to read; the first sheet is used when absent
        #[arg(long, default_value = "")]
        sheet: String,
        /// Header row, 1-based; rows above it are skipped
        #[arg(long, default_value_t = 0)]
        header_row: u32,
        /// Header space handling: replace (spaces become underscores) or remove
        #[arg(long, default_value = "remove")]
        header_spaces: SpaceMode,
        /// Delimiter used when merging duplicate header columns
        #[arg(long, default_value_t = ';')]
        duplicate_delimiter: char,
        #[command(flatten)]
        target: TargetArgs,
    },
}

/// Where and how the parsed rows are delivered.
#[derive(Args)]
struct TargetArgs {
    /// Object service host
    #[arg(long, default_value = "localhost")]
    host: String,
    /// Object service port
    #[arg(long, default_value_t = 5555)]
    port: u16,
    /// Target object name
    #[arg(long)]
    object: String,
    /// Create method to execute on the target object
    #[arg(long, default_value = "Create")]
    method: String,
    /// Deliver all rows in one batch call instead of row by row
    #[arg(long)]
    bulk: bool,
    /// Transaction id column to stamp on every record
    #[arg(long, default_value = "")]
    transaction_column: String,
    /// Transaction id value to stamp on every record
    #[arg(long, default_value = "")]
    transaction_value: String,
    /// Header space handling used to look up the transaction column
    #[arg(long, default_value = "replace")]
    upload_header_spaces: SpaceMode,
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Csv {
            file,
            delimiter,
            qualifier,
            header_spaces,
            target,
        } => {
            let settings = CsvImportSettings {
                file: wrap_file(&file)?,
                column_delimiter: delimiter,
                text_qualifier: qualifier,
                header_spaces,
            };
            run(CsvImporter::new(settings), target).await
        }
        Command::Excel {
            file,
            sheet,
            header_row,
            header_spaces,
            duplicate_delimiter,
            target,
        } => {
            let settings = ExcelImportSettings {
                file: wrap_file(&file)?,
                sheet_name: sheet,
                header_row_index: ExcelImportSettings::host_header_row(header_row),
                header_spaces,
                duplicate_delimiter,
            };
            run(ExcelImporter::new(settings), target).await
        }
    }
}

/// Read a local file and wrap it in the envelope the pipeline consumes.
fn wrap_file(path: &Path) -> Result<String> {
    let bytes =
        fs::read(path).with_context(|| format!("Failed to read '{}'", path.display()))?;
    let name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("import");
    Ok(envelope::pack_file(name, &bytes))
}

async fn run(mut importer: impl Importer, target: TargetArgs) -> Result<()> {
    importer.parse();
    println!(
        "Importing {}: {}",
        paint_import(importer.status()),
        importer.message()
    );

    let Some(table) = importer.results() else {
        return Ok(());
    };

    let settings = UploadSettings {
        host: target.host,
        port: target.port,
        object_name: target.object,
        create_method: target.method,
        bulk: target.bulk,
        transaction_id_name: target.transaction_column,
        transaction_id_value: target.transaction_value,
        header_spaces: target.upload_header_spaces,
        table: table.clone(),
    };

    let client = ObjectServiceClient::new(settings.host.clone(), settings.port);
    let mut uploader = Uploader::new(&settings, &client);
    uploader.upload().await;

    println!(
        "Uploading {}: {}",
        paint_upload(uploader.status()),
        uploader.message()
    );

    Ok(())
}

fn paint_import(status: ImportStatus) -> ColoredString {
    match status {
        ImportStatus::Complete => status.to_string().green(),
        ImportStatus::Error => status.to_string().red(),
        _ => status.to_string().yellow(),
    }
}

fn paint_upload(status: UploadStatus) -> ColoredString {
    match status {
        UploadStatus::Complete => status.to_string().green(),
        UploadStatus::Partial => status.to_string().yellow(),
        UploadStatus::Error => status.to_string().red(),
        UploadStatus::Pending => status.to_string().normal(),
    }
}

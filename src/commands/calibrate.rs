use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CalibrateArgs;
use crate::commands::load_tokens;
use crate::extract::{calibrate, font_histogram};
use crate::util::write_json_pretty;

pub fn run(args: CalibrateArgs) -> Result<()> {
    let (tokens, source_path) = load_tokens(&args.source, &args.bold_hint)?;
    info!(path = %source_path.display(), tokens = tokens.len(), "sampling font sizes");

    let histogram = font_histogram(&tokens);
    for (size, chars) in &histogram.chars_by_size {
        let numeric = histogram.numeric_tokens_by_size.get(size).copied().unwrap_or(0);
        debug!(size = %size, chars, numeric_tokens = numeric, "font size sample");
    }

    let calibration = calibrate(&tokens, &args.bold_hint)?;
    calibration.validate()?;

    match &args.output {
        Some(path) => {
            write_json_pretty(path, &calibration)?;
            info!(path = %path.display(), "wrote calibration");
        }
        None => {
            let mut output = io::BufWriter::new(io::stdout().lock());
            serde_json::to_writer_pretty(&mut output, &calibration)
                .context("failed to serialize calibration json output")?;
            writeln!(output)?;
            output.flush()?;
        }
    }

    Ok(())
}

pub mod audit;
pub mod parse_osm;
pub mod process_map;
pub mod shape;
pub mod validate;
pub mod write_csv;

use log::{error, info};

use crate::errors::{Error, Result};

/// A single pass over a stream of elements. `extract` opens the lazy source,
/// each item is transformed and loaded before the next one is read, and
/// `finish` runs exactly once whether or not an earlier phase failed.
pub trait Etl {
    type Input;
    type Output;
    type Source: Iterator<Item = Result<Self::Input>>;

    fn etl_name(&self) -> &str;

    fn show_progress(&self) -> bool {
        false
    }

    fn extract(&mut self) -> Result<Self::Source>;
    fn transform(&mut self, input: Self::Input) -> Result<Option<Self::Output>>;
    fn load(&mut self, output: Self::Output) -> Result<()>;
    fn finish(&mut self) -> Result<()>;

    fn process(&mut self) -> Result<()> {
        info!(etl_name = self.etl_name(); "Starting ETL process");

        info!(etl_name = self.etl_name(); "Extracting");
        let source = match self.extract() {
            Ok(source) => source,
            Err(err) => {
                log_failure(self.etl_name(), "Extraction", &err);
                return Err(err);
            }
        };

        info!(etl_name = self.etl_name(); "Transforming and loading");
        let outcome = if self.show_progress() {
            self.run(tqdm::tqdm(source))
        } else {
            self.run(source)
        };

        let finished = self.finish();
        if let Err(err) = &finished {
            log_failure(self.etl_name(), "Finishing", err);
        }
        outcome?;
        finished?;

        info!(etl_name = self.etl_name(); "Process finished");
        Ok(())
    }

    fn run<I>(&mut self, source: I) -> Result<()>
    where
        I: Iterator<Item = Result<Self::Input>>,
    {
        for item in source {
            let input = match item {
                Ok(input) => input,
                Err(err) => {
                    log_failure(self.etl_name(), "Extraction", &err);
                    return Err(err);
                }
            };

            let output = match self.transform(input) {
                Ok(Some(output)) => output,
                Ok(None) => continue,
                Err(err) => {
                    log_failure(self.etl_name(), "Transformation", &err);
                    return Err(err);
                }
            };

            if let Err(err) = self.load(output) {
                log_failure(self.etl_name(), "Loading", &err);
                return Err(err);
            }
        }
        Ok(())
    }
}

fn log_failure(etl_name: &str, phase: &str, err: &Error) {
    let message = err.to_string();
    error!(etl_name = etl_name, phase = phase, err = message.as_str(); "ETL phase failed with error");
}

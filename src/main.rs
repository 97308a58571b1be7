use std::fs::{self, OpenOptions};
use std::io::{self, Write};

use eyre::{Result, WrapErr};
use memento_calc::observer::{AutoSaveObserver, LoggingObserver};
use memento_calc::repl::Repl;
use memento_calc::{Calculator, CalculatorConfig};

fn main() -> Result<()> {
    color_eyre::install()?;

    let config = CalculatorConfig::from_env().wrap_err("Invalid calculator configuration")?;
    config
        .validate()
        .wrap_err("Invalid calculator configuration")?;
    init_logging(&config)?;

    log::info!("Calculator starting");

    let mut calculator = Calculator::open(config).wrap_err("Failed to start calculator")?;
    calculator.add_observer(Box::new(LoggingObserver));
    let auto_save = AutoSaveObserver::new(calculator.store(), calculator.config().auto_save);
    calculator.add_observer(Box::new(auto_save));

    let stdin = io::stdin();
    let mut repl = Repl::new(calculator, stdin.lock(), io::stdout().lock());
    repl.run()?;

    log::info!("Calculator stopping");

    Ok(())
}

/// Route `log` output to the configured log file
///
/// The level defaults to `info` and can be changed through `RUST_LOG`.
fn init_logging(config: &CalculatorConfig) -> Result<()> {
    let log_file = config.log_file();
    if let Some(dir) = log_file.parent() {
        fs::create_dir_all(dir)
            .wrap_err_with(|| format!("Failed to create log directory {}", dir.display()))?;
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_file)
        .wrap_err_with(|| format!("Failed to open log file {}", log_file.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .format(|buf, record| {
            writeln!(
                buf,
                "{} - {} - {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
                record.level(),
                record.args()
            )
        })
        .try_init()
        .wrap_err("Failed to initialize logging")?;

    log::info!("Logging initialized at: {}", log_file.display());
    Ok(())
}

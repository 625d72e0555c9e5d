mod cli;
mod commands;
mod env_loader;
mod error;
mod logging;
mod pkgsite;

fn main() {
    env_loader::load_dotenv();

    match cli::run() {
        Ok(true) => {}
        Ok(false) => std::process::exit(2),
        Err(err) => {
            match err.downcast_ref::<error::PkgsiteError>() {
                Some(known) => eprintln!("error[{}]: {err:#}", known.code()),
                None => eprintln!("error: {err:#}"),
            }
            std::process::exit(1);
        }
    }
}

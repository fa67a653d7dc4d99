use clap::Parser;

use crate::app::AppConfig;

#[derive(Parser, Debug)]
#[command(name = "dlproxy")]
#[command(about = "Aggregating proxy for academic deadline platforms")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Address to bind
    #[arg(long, default_value = "127.0.0.1", env = "DLPROXY_HOST")]
    pub host: String,

    /// Port to bind
    #[arg(short, long, default_value_t = 5000, env = "DLPROXY_PORT")]
    pub port: u16,

    /// Gradescope base URL (override for testing against a mirror)
    #[arg(
        long,
        value_name = "URL",
        default_value = dlp::upstream::gradescope::DEFAULT_BASE_URL,
        env = "DLPROXY_GRADESCOPE_URL"
    )]
    pub gradescope_url: String,

    /// EGate/Blackboard portal base URL; the exam and blackboard
    /// endpoints answer an error until this is set
    #[arg(long, value_name = "URL", env = "DLPROXY_EGATE_URL")]
    pub egate_url: Option<String>,
}

impl Cli {
    pub fn app_config(&self) -> AppConfig {
        AppConfig {
            gradescope_url: self.gradescope_url.clone(),
            egate_url: self.egate_url.clone(),
        }
    }
}

use clap::Parser;
use std::{net::SocketAddr, path::PathBuf};

pub const SNAPSHOT_FILE: &str = "students.dat";

#[derive(Clone, Debug, Parser)]
#[clap(name = "student-directory", about = "HTTP directory of student records")]
pub struct Config {
    #[clap(
        short,
        long,
        env = "STUDENT_DIRECTORY_BIND_ADDR",
        default_value = "127.0.0.1:3000"
    )]
    pub bind_addr: SocketAddr,

    /// Directory holding the records snapshot.
    #[clap(long, env = "STUDENT_DIRECTORY_DATA_DIR", default_value = "data")]
    pub data_dir: PathBuf,

    /// Keep records in memory only; everything is lost on exit.
    #[clap(long, env = "STUDENT_DIRECTORY_EPHEMERAL", default_value_t = false)]
    pub ephemeral: bool,
}

impl Config {
    pub fn snapshot_path(&self) -> Option<PathBuf> {
        if self.ephemeral {
            None
        } else {
            Some(self.data_dir.join(SNAPSHOT_FILE))
        }
    }
}

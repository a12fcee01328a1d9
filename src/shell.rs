use std::process::{Command, Stdio};

use anyhow::{Result, bail};
use colored::Colorize;

pub trait Shell {
    fn exec(&mut self, print_cmd: bool) -> Result<()>;
}

impl Shell for Command {
    fn exec(&mut self, print_cmd: bool) -> Result<()> {
        if print_cmd {
            let mut cmd_str = self.get_program().to_string_lossy().to_string();

            for arg in self.get_args() {
                cmd_str += " ";
                cmd_str += arg.to_string_lossy().as_ref();
            }

            println!("{}", cmd_str.purple().bold());
        }

        let status = self
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()?;

        if !status.success() {
            bail!(
                "{} failed with status: {status}",
                self.get_program().to_string_lossy()
            );
        }

        Ok(())
    }
}

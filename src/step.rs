use anyhow::Result;

use crate::project::Project;

pub trait Step {
    fn run(&mut self, project: &mut Project) -> Result<()>;
}

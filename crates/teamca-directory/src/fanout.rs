//! Bounded per-team fan-out shared by distribution and maintenance

use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use crate::error::{DirectoryError, Result};

/// Run `op` once per team with at most `slots` permits in flight.
///
/// Each task takes its permit before touching the store. Results come back
/// in completion order, paired with their team.
pub(crate) async fn for_each_team<T, F, Fut>(
    teams: Vec<String>,
    slots: Arc<Semaphore>,
    op: F,
) -> Vec<(String, Result<T>)>
where
    T: Send + 'static,
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T>> + Send + 'static,
{
    let op = Arc::new(op);
    let mut tasks = JoinSet::new();

    for team in teams {
        let slots = slots.clone();
        let op = op.clone();
        tasks.spawn(async move {
            let result = match slots.acquire_owned().await {
                Ok(_permit) => op(team.clone()).await,
                Err(_) => Err(DirectoryError::TaskFailed {
                    team: team.clone(),
                    reason: "concurrency limiter closed".to_string(),
                }),
            };
            (team, result)
        });
    }

    let mut results = Vec::with_capacity(tasks.len());
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok(pair) => results.push(pair),
            Err(e) => results.push((
                String::new(),
                Err(DirectoryError::TaskFailed {
                    team: String::new(),
                    reason: e.to_string(),
                }),
            )),
        }
    }
    results
}

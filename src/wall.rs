use std::path::PathBuf;

use futures::{Stream, StreamExt};

use crate::config::PageConfig;
use crate::controls::Command;
use crate::error::Result;
use crate::sources::{PostSource, Subscription};
use crate::view::ViewController;

/// A mounted wall: the view plus the subscription feeding it.
/// Dropping the wall unmounts it and releases the subscription.
pub struct Wall {
    view: ViewController,
    subscription: Subscription,
    page: PageConfig,
    output: PathBuf,
}

impl Wall {
    pub fn mount(source: &impl PostSource, view: ViewController, page: PageConfig, output: PathBuf) -> Self {
        tracing::info!(output = %output.display(), "mounting wall");
        Self {
            view,
            subscription: source.subscribe(),
            page,
            output,
        }
    }

    pub fn view(&self) -> &ViewController {
        &self.view
    }

    /// Writes the current page. Readers never see a half-written file.
    pub async fn publish(&self) -> Result<()> {
        if let Some(parent) = self.output.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.output.clone().into_os_string();
        tmp.push(".tmp");
        let html = self.view.render(&self.page)?;
        tokio::fs::write(&tmp, html).await?;
        tokio::fs::rename(&tmp, &self.output).await?;

        tracing::info!(
            filter = %self.view.filter(),
            panel_open = self.view.panel_open(),
            visible = self.view.visible().len(),
            total = self.view.snapshot().len(),
            "wall updated"
        );
        Ok(())
    }

    /// Runs until the user quits or the source shuts down. Every state
    /// change is published right away.
    pub async fn run<S>(&mut self, mut commands: S) -> Result<()>
    where
        S: Stream<Item = String> + Unpin,
    {
        self.publish().await?;
        let mut controls_open = true;

        loop {
            tokio::select! {
                snapshot = self.subscription.next() => match snapshot {
                    Some(posts) => {
                        tracing::info!(count = posts.len(), "new posts");
                        self.view.receive(posts);
                    }
                    None => {
                        tracing::info!("push channel shut down");
                        return Ok(());
                    }
                },
                line = commands.next(), if controls_open => match line {
                    Some(line) if line.trim().is_empty() => continue,
                    Some(line) => match line.parse::<Command>() {
                        Ok(command) => {
                            if !self.view.apply(command) {
                                return Ok(());
                            }
                        }
                        Err(e) => {
                            tracing::warn!("{e}");
                            continue;
                        }
                    },
                    None => {
                        tracing::debug!("controls closed");
                        controls_open = false;
                        continue;
                    }
                },
            }

            self.publish().await?;
        }
    }
}

impl Drop for Wall {
    fn drop(&mut self) {
        tracing::info!("unmounting wall");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    use serde_json::json;
    use tokio::sync::mpsc;

    use super::*;
    use crate::filter::Filter;
    use crate::post::{parse_snapshot, Post};
    use crate::sources::SNAPSHOT_BUFFER;

    /// Pushes canned snapshots, then shuts down.
    struct Replay(Vec<Vec<Post>>);

    impl PostSource for Replay {
        fn subscribe(&self) -> Subscription {
            let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
            let snapshots = self.0.clone();
            let task = tokio::spawn(async move {
                for snapshot in snapshots {
                    if tx.send(snapshot).await.is_err() {
                        return;
                    }
                }
            });
            Subscription::new(rx, task)
        }
    }

    /// Never pushes, only counts live subscriptions.
    struct Counting(Arc<AtomicUsize>);

    struct Live(Arc<AtomicUsize>);

    impl Drop for Live {
        fn drop(&mut self) {
            self.0.fetch_sub(1, Ordering::SeqCst);
        }
    }

    impl PostSource for Counting {
        fn subscribe(&self) -> Subscription {
            let (tx, rx) = mpsc::channel(SNAPSHOT_BUFFER);
            self.0.fetch_add(1, Ordering::SeqCst);
            let live = Live(self.0.clone());
            let task = tokio::spawn(async move {
                let _live = live;
                let _tx = tx;
                std::future::pending::<()>().await;
            });
            Subscription::new(rx, task)
        }
    }

    fn output(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("socialwall-test-{}", std::process::id()))
            .join(name)
    }

    #[tokio::test]
    async fn latest_snapshot_is_published() {
        let first = parse_snapshot(json!([{ "type": "youtube", "title": "old video" }])).unwrap();
        let second = parse_snapshot(json!([
            { "type": "youtube", "title": "new video" },
            { "type": "instagram", "image": "b.jpg", "message": "hi" },
        ]))
        .unwrap();

        let path = output("latest.html");
        let mut wall = Wall::mount(
            &Replay(vec![first, second]),
            ViewController::new(Filter::All, false),
            PageConfig::default(),
            path.clone(),
        );
        wall.run(futures::stream::pending()).await.unwrap();

        assert_eq!(wall.view().snapshot().len(), 2);
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains("new video"));
        assert!(!html.contains("old video"));
        assert!(html.contains(r#"src="b.jpg""#));
    }

    #[tokio::test]
    async fn commands_update_the_page() {
        let path = output("commands.html");
        let source = Counting(Arc::new(AtomicUsize::new(0)));
        let mut wall = Wall::mount(&source, ViewController::default(), PageConfig::default(), path.clone());

        let commands = futures::stream::iter(
            ["bogus", "", "panel", "tiktok", "quit", "youtube"].map(String::from),
        );
        wall.run(commands).await.unwrap();

        assert!(wall.view().panel_open());
        assert_eq!(wall.view().filter().value(), "tiktok");
        let html = std::fs::read_to_string(&path).unwrap();
        assert!(html.contains(r#"data-filter="tiktok" aria-pressed="true""#));
        assert!(html.contains(r#"id="instructions" class="block lg:block"#));
    }

    #[tokio::test]
    async fn remounting_keeps_one_subscription() {
        let live = Arc::new(AtomicUsize::new(0));
        let source = Counting(live.clone());

        for _ in 0..3 {
            let wall = Wall::mount(&source, ViewController::default(), PageConfig::default(), output("remount.html"));
            assert_eq!(live.load(Ordering::SeqCst), 1);
            drop(wall);

            // let the runtime reap the aborted task
            for _ in 0..10 {
                if live.load(Ordering::SeqCst) == 0 {
                    break;
                }
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            assert_eq!(live.load(Ordering::SeqCst), 0);
        }
    }
}

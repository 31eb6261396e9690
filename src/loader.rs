//! The staged download pipeline: manga metadata, chapter list, page lists,
//! page images, archive.
//!
//! Every stage fully completes before the next one starts. The two
//! concurrent stages each own one [`WorkerPool`] run and share the request
//! pacer, so the request rate does not grow with the worker count.

use crate::archive;
use crate::client::MangaClient;
use crate::config::Config;
use crate::limiter::RateLimiter;
use crate::pool::{Job, JobResult, WorkerPool};
use crate::requests::chapter::{self, Chapter, PagesQuery};
use crate::requests::manga::{self, Manga};
use crate::requests::page;
use crate::requests::{Error, Result};

use kdam::tqdm;

use std::path::PathBuf;
use std::sync::Arc;

pub struct MangaLoader {
    client: MangaClient,
    config: Config,
    limiter: Arc<RateLimiter>,
}

impl MangaLoader {
    pub fn new(client: MangaClient, config: Config) -> Self {
        let limiter = Arc::new(RateLimiter::new(config.request_pacing));

        Self {
            client,
            config,
            limiter,
        }
    }

    fn manga_url(&self) -> String {
        format!("{}/manga/{}", self.config.api_base_url, self.config.slug)
    }

    /// Runs the full pipeline and returns the path of the produced archive.
    ///
    /// Any error is terminal: the run stops at the failing stage and staged
    /// files are left on disk for inspection.
    pub async fn run(&self) -> Result<PathBuf> {
        let mut manga = self.fetch_manga().await?;
        let chapters = self.fetch_chapters().await?;
        manga.chapters = self.resolve_pages(chapters).await?;

        self.download_images(&manga).await?;

        let artifact = self.archive(&manga)?;

        if self.config.retain_staging {
            tracing::info!(
                staging = %self.config.staging_root.display(),
                "staging directory retained"
            );
        } else {
            std::fs::remove_dir_all(&self.config.staging_root)?;
        }

        Ok(artifact)
    }

    async fn fetch_manga(&self) -> Result<Manga> {
        let body = self.client.get_bytes(&self.manga_url()).await?;
        let manga = manga::decode(&body)?;

        tracing::info!(id = manga.id, name = %manga.name, "manga loaded");

        Ok(manga)
    }

    async fn fetch_chapters(&self) -> Result<Vec<Chapter>> {
        let url = format!("{}/chapters", self.manga_url());
        let body = self.client.get_bytes(&url).await?;
        let chapters = chapter::decode_list(&body)?;

        tracing::info!(count = chapters.len(), "chapters loaded");

        let tags = self.config.volumes.tags();
        let chapters = chapter::filter_by_volumes(chapters, &tags);

        tracing::info!(
            count = chapters.len(),
            volumes = %self.config.volumes,
            "chapters filtered"
        );

        if chapters.is_empty() {
            return Err(Error::NoChaptersFound {
                volumes: self.config.volumes.to_string(),
            });
        }

        Ok(chapters)
    }

    /// One job per surviving chapter, each fetching that chapter's page list
    async fn resolve_pages(&self, chapters: Vec<Chapter>) -> Result<Vec<Chapter>> {
        let mut pool =
            WorkerPool::new(self.config.workers).with_limiter(Arc::clone(&self.limiter));
        pool.submit(
            chapters
                .into_iter()
                .enumerate()
                .map(|(id, payload)| Job { id, payload }),
        );

        let client = self.client.clone();
        let manga_url = self.manga_url();

        let results = pool
            .run(move |mut chapter: Chapter| {
                let client = client.clone();
                let manga_url = manga_url.clone();

                async move {
                    let query = serde_qs::to_string(&PagesQuery {
                        number: &chapter.number,
                        volume: &chapter.volume,
                    })?;
                    let url = format!("{manga_url}/chapter?{query}");

                    let body = client.get_bytes(&url).await?;
                    chapter.pages = page::decode_list(&body)?;

                    tracing::info!(
                        volume = %chapter.volume,
                        number = %chapter.number,
                        count = chapter.pages.len(),
                        "pages loaded"
                    );

                    Ok(chapter)
                }
            })
            .await;

        collect_in_order(results)
    }

    /// One job per page across all chapters, downloading image bytes into
    /// the staging tree
    async fn download_images(&self, manga: &Manga) -> Result<()> {
        tokio::fs::create_dir_all(&self.config.staging_root).await?;

        let jobs = self.page_jobs(manga);
        let total = jobs.len();

        let mut pool = WorkerPool::new(self.config.workers)
            .with_limiter(Arc::clone(&self.limiter))
            .with_progress(tqdm!(total = total, desc = "pages"));
        pool.submit(jobs);

        tracing::info!(count = total, workers = self.config.workers, "download jobs added");

        let client = self.client.clone();

        let results = pool
            .run(move |download: PageDownload| {
                let client = client.clone();

                async move {
                    let bytes = client.get_bytes(&download.url).await?;

                    if let Some(parent) = download.target.parent() {
                        // two workers may race on the same chapter directory
                        tokio::fs::create_dir_all(parent).await?;
                    }
                    tokio::fs::write(&download.target, &bytes).await?;

                    tracing::debug!(
                        target = %download.target.display(),
                        written = bytes.len(),
                        "image saved"
                    );

                    Ok(())
                }
            })
            .await;

        for result in results {
            result.outcome?;
        }

        Ok(())
    }

    fn page_jobs(&self, manga: &Manga) -> Vec<Job<PageDownload>> {
        let mut jobs = Vec::new();

        for chapter in &manga.chapters {
            let chapter_dir = self
                .config
                .staging_root
                .join(&chapter.volume)
                .join(&chapter.number);

            for page in &chapter.pages {
                jobs.push(Job {
                    id: jobs.len(),
                    payload: PageDownload {
                        url: format!("{}{}", self.config.image_base_url, page.url),
                        target: chapter_dir.join(page.file_name()),
                    },
                });
            }
        }

        jobs
    }

    fn archive(&self, manga: &Manga) -> Result<PathBuf> {
        let output = self.config.output_root.join(self.artifact_name(manga));

        tracing::info!(
            output = %output.display(),
            staging = %self.config.staging_root.display(),
            "compressing"
        );

        archive::compress_directory(&output, &self.config.staging_root)?;

        Ok(output)
    }

    fn artifact_name(&self, manga: &Manga) -> String {
        format!(
            "{}_{}_vol.{}",
            manga.name, self.config.volumes, self.config.extension
        )
    }
}

/// Work unit of the image download stage
#[derive(Debug, Clone)]
struct PageDownload {
    url: String,
    target: PathBuf,
}

/// Restores submission order via the correlation ids and surfaces the first
/// error in that order
fn collect_in_order<T>(mut results: Vec<JobResult<T>>) -> Result<Vec<T>> {
    results.sort_by_key(|r| r.id);

    let mut collected = Vec::with_capacity(results.len());
    for result in results {
        collected.push(result.outcome?);
    }

    Ok(collected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collect_in_order_restores_submission_order() {
        let results = vec![
            JobResult { id: 2, outcome: Ok("c") },
            JobResult { id: 0, outcome: Ok("a") },
            JobResult { id: 1, outcome: Ok("b") },
        ];

        assert_eq!(collect_in_order(results).unwrap(), vec!["a", "b", "c"]);
    }

    #[test]
    fn collect_in_order_surfaces_the_error() {
        let results = vec![
            JobResult { id: 1, outcome: Ok(()) },
            JobResult {
                id: 0,
                outcome: Err(Error::UnexpectedStatus {
                    status: 404,
                    url: "http://api/chapter".to_owned(),
                }),
            },
        ];

        assert!(matches!(
            collect_in_order(results),
            Err(Error::UnexpectedStatus { status: 404, .. })
        ));
    }
}

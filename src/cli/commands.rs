use std::path::PathBuf;
use std::time::Duration;

use crate::{
    analysis::{
        orphans, tag_frequencies, CentroidGapDetector, ForNoteSuggester, HybridScorer,
        OrphanClusterer,
    },
    cli::{
        errors::{CliError, CliResult},
        report::{CurationReport, RelatedReport},
        types::{CurateArgs, CurateMode, RelatedArgs},
        validation::*,
    },
    config::Config,
    mentions::MentionsClient,
    notes::{self, MemberSource, Note, NoteRepository},
    semantic::EmbeddingStore,
};

/// Command for ranking notes related to one note file
pub struct RelatedCommand {
    pub target: PathBuf,
    pub limit: usize,
    pub min_score: f32,
    scorer: HybridScorer,
    mentions: Option<MentionsClient>,
}

impl RelatedCommand {
    pub fn new(args: &RelatedArgs, config: &Config) -> CliResult<Self> {
        validate_limit(args.limit)?;

        let mentions = (config.mentions.enabled && !args.no_mentions).then(|| {
            MentionsClient::new(
                config.mentions.url.clone(),
                Duration::from_secs(config.mentions.timeout_secs),
            )
        });

        Ok(Self {
            target: args.file.clone(),
            limit: args.limit,
            min_score: args.min_score,
            scorer: HybridScorer::new(config.scoring.clone()),
            mentions,
        })
    }

    pub fn execute(
        &self,
        repo: &NoteRepository,
        store: &mut EmbeddingStore,
    ) -> CliResult<RelatedReport> {
        let target = NoteRepository::load_note(&self.target)?
            .ok_or_else(|| CliError::NotANote(self.target.clone()))?;

        let all_notes = repo.load_all()?;
        let tag_freq = tag_frequencies(&all_notes);

        let candidates: Vec<Note> = all_notes
            .into_iter()
            .filter(|n| n.slug != target.slug)
            .collect();

        // The target may live outside the content directory.
        let embeddings = store.ensure_embeddings(std::iter::once(&target).chain(&candidates))?;

        let ranked = self.scorer.rank(
            &target,
            &candidates,
            &embeddings,
            &tag_freq,
            self.min_score,
            self.limit,
        );
        log::debug!("{} notes scored above {}", ranked.len(), self.min_score);

        let mentions = self
            .mentions
            .as_ref()
            .map(|client| client.fetch(&target.slug, &target.title))
            .unwrap_or_default();

        Ok(RelatedReport::new(&target, &ranked, mentions))
    }
}

/// Command for index page curation
#[derive(Debug, Clone)]
pub struct CurateCommand {
    pub mode: CurateMode,
    pub note: Option<String>,
    pub threshold: f32,
    pub eps: f32,
    pub min_cluster_size: usize,
    pub common_tag_ratio: f32,
}

impl CurateCommand {
    /// Command-line values win over the config's curation defaults.
    pub fn new(args: &CurateArgs, config: &Config) -> CliResult<Self> {
        let defaults = &config.curation;
        let threshold = args.threshold.unwrap_or(defaults.similarity_threshold);
        let eps = args.eps.unwrap_or(defaults.cluster_eps);
        let min_cluster_size = args.min_cluster_size.unwrap_or(defaults.min_cluster_size);

        validate_threshold(threshold)?;
        validate_eps(eps)?;
        validate_min_cluster_size(min_cluster_size)?;

        let note = match args.mode {
            CurateMode::ForNote => Some(notes::normalize_slug(&validate_note_slug(
                args.note.as_deref(),
            )?)),
            _ => None,
        };

        Ok(Self {
            mode: args.mode,
            note,
            threshold,
            eps,
            min_cluster_size,
            common_tag_ratio: defaults.common_tag_ratio,
        })
    }

    pub fn execute(
        &self,
        repo: &NoteRepository,
        store: &mut EmbeddingStore,
        members: &dyn MemberSource,
    ) -> CliResult<CurationReport> {
        let all_notes = repo.load_all()?;

        let target = match &self.note {
            Some(slug) => Some(
                notes::find(&all_notes, slug)
                    .ok_or_else(|| CliError::NoteNotFound(slug.clone()))?,
            ),
            None => None,
        };

        let pages: Vec<&Note> = all_notes.iter().filter(|n| n.is_index_page()).collect();
        log::info!("{} notes, {} index pages", all_notes.len(), pages.len());

        let embeddings = store.ensure_embeddings(&all_notes)?;
        let mut report = CurationReport::default();

        if self.mode.finds_gaps() {
            let detector = CentroidGapDetector::new(members, self.threshold);
            report.moc_updates = Some(detector.find_gaps(&pages, &all_notes, &embeddings));
        }

        if self.mode.finds_clusters() {
            let orphans = orphans(&all_notes, &pages, members);
            let clusterer =
                OrphanClusterer::new(self.eps, self.min_cluster_size, self.common_tag_ratio);
            report.new_clusters = Some(clusterer.cluster(&orphans, &embeddings));
        }

        if let Some(note) = target {
            let suggester = ForNoteSuggester::new(members, self.threshold);
            report.for_note = Some(suggester.suggest(note, &pages, &embeddings));
        }

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::notes::FileLinks;
    use crate::semantic::DEFAULT_MODEL;
    use crate::tests::{write_note, CountingProvider};

    struct Fixture {
        tmp: tempfile::TempDir,
        config: Config,
        provider: CountingProvider,
    }

    impl Fixture {
        fn content_dir(&self) -> &Path {
            &self.config.content_dir
        }

        fn repo(&self) -> NoteRepository {
            NoteRepository::new(self.content_dir())
        }

        fn store(&self) -> EmbeddingStore {
            EmbeddingStore::open(
                self.tmp.path().join("embeddings.bin"),
                DEFAULT_MODEL,
                self.provider.factory(),
            )
        }
    }

    /// An index page linking three focus notes, one unlinked focus note,
    /// three tagged habit notes and an unrelated note.
    fn corpus() -> Fixture {
        let tmp = tempfile::tempdir().unwrap();
        let content = tmp.path().join("content");
        std::fs::create_dir_all(&content).unwrap();

        write_note(
            &content,
            "productivity-map",
            "title: Productivity\ntype: map\ntags: [focus]",
            "- [[deep-work]]\n- [[Flow|flow states]]\n- [[focus-mode]]\n",
        );
        write_note(
            &content,
            "deep-work",
            "title: Deep Work\ntags: [focus]\nauthors: [cal-newport]",
            "",
        );
        write_note(
            &content,
            "flow",
            "title: Flow\ntags: [focus]\nauthors: cal-newport",
            "",
        );
        write_note(&content, "focus-mode", "title: Focus Mode", "");
        write_note(
            &content,
            "time-blocking",
            "title: Time Blocking\ntags: [focus, planning]",
            "",
        );
        for (slug, title) in [
            ("habit-stacking", "Habit Stacking"),
            ("habit-loops", "Habit Loops"),
            ("tiny-habits", "Tiny Habits"),
        ] {
            write_note(&content, slug, &format!("title: {title}\ntags: [habits]"), "");
        }
        write_note(&content, "sourdough", "title: Sourdough", "");
        std::fs::write(content.join("scratch.md"), "no metadata here").unwrap();

        let provider = CountingProvider::new(3)
            .with_vector("Deep Work", vec![1.0, 0.1, 0.0])
            .with_vector("Flow", vec![1.0, -0.1, 0.0])
            .with_vector("Focus Mode", vec![1.0, 0.0, 0.0])
            .with_vector("Time Blocking", vec![0.9, (1.0f32 - 0.81).sqrt(), 0.0])
            .with_vector("Habit Stacking", vec![0.0, 0.05, 1.0])
            .with_vector("Habit Loops", vec![0.05, 0.0, 1.0])
            .with_vector("Tiny Habits", vec![0.0, 0.0, 1.0])
            .with_vector("Sourdough", vec![0.0, 1.0, 0.0]);

        let mut config = Config::load_with(&tmp.path().join("base")).unwrap();
        config.content_dir = content;
        config.mentions.enabled = false;

        Fixture {
            tmp,
            config,
            provider,
        }
    }

    fn related_args(file: &Path) -> RelatedArgs {
        RelatedArgs {
            file: file.to_path_buf(),
            limit: 10,
            min_score: 5.0,
            no_mentions: true,
            rebuild_cache: false,
        }
    }

    fn curate_args(mode: CurateMode) -> CurateArgs {
        CurateArgs {
            mode,
            note: None,
            threshold: None,
            eps: None,
            min_cluster_size: None,
            rebuild_cache: false,
        }
    }

    fn curate_json(fx: &Fixture, args: &CurateArgs) -> serde_json::Value {
        let command = CurateCommand::new(args, &fx.config).unwrap();
        let report = command
            .execute(&fx.repo(), &mut fx.store(), &FileLinks)
            .unwrap();
        serde_json::from_str(&report.to_json().unwrap()).unwrap()
    }

    fn keys(value: &serde_json::Value) -> Vec<&str> {
        let mut keys: Vec<&str> = value
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        keys.sort();
        keys
    }

    #[test]
    fn test_related_ranks_by_hybrid_score() {
        let fx = corpus();
        let args = related_args(&fx.content_dir().join("deep-work.md"));
        let command = RelatedCommand::new(&args, &fx.config).unwrap();

        let report = command.execute(&fx.repo(), &mut fx.store()).unwrap();

        assert_eq!(report.target_slug, "deep-work");
        let slugs: Vec<_> = report.entries.iter().map(|e| e.slug.as_str()).collect();
        assert_eq!(slugs[0], "flow");
        assert!(!slugs.contains(&"deep-work"));
        assert!(!slugs.contains(&"sourdough"));
        assert!(report.entries[0]
            .breakdown
            .iter()
            .any(|line| line.contains("Same author: cal-newport")));
        assert!(report.to_string().contains("1. [[flow]] - score: "));
        assert!(report.mentions.is_empty());
    }

    #[test]
    fn test_related_respects_limit() {
        let fx = corpus();
        let mut args = related_args(&fx.content_dir().join("deep-work.md"));
        args.limit = 2;

        let report = RelatedCommand::new(&args, &fx.config)
            .unwrap()
            .execute(&fx.repo(), &mut fx.store())
            .unwrap();
        assert_eq!(report.entries.len(), 2);
    }

    #[test]
    fn test_related_target_outside_content_dir() {
        let fx = corpus();
        let elsewhere = fx.tmp.path().join("drafts");
        std::fs::create_dir_all(&elsewhere).unwrap();
        let draft = write_note(&elsewhere, "draft", "title: Focus Mode", "");

        let report = RelatedCommand::new(&related_args(&draft), &fx.config)
            .unwrap()
            .execute(&fx.repo(), &mut fx.store())
            .unwrap();

        assert_eq!(report.target_slug, "draft");
        let slugs: Vec<_> = report.entries.iter().map(|e| e.slug.as_str()).collect();
        assert!(slugs.contains(&"focus-mode"));
    }

    #[test]
    fn test_related_rejects_file_without_metadata() {
        let fx = corpus();
        let command =
            RelatedCommand::new(&related_args(&fx.content_dir().join("scratch.md")), &fx.config)
                .unwrap();

        let result = command.execute(&fx.repo(), &mut fx.store());
        assert!(matches!(result, Err(CliError::NotANote(_))));
        assert_eq!(fx.provider.calls.get(), 0);
    }

    #[test]
    fn test_related_rejects_zero_limit() {
        let fx = corpus();
        let mut args = related_args(&fx.content_dir().join("deep-work.md"));
        args.limit = 0;
        assert!(matches!(
            RelatedCommand::new(&args, &fx.config),
            Err(CliError::Validation { .. })
        ));
    }

    #[test]
    fn test_curate_full_reports_gaps_and_clusters() {
        let fx = corpus();
        let json = curate_json(&fx, &curate_args(CurateMode::Full));

        assert_eq!(keys(&json), vec!["moc_updates", "new_clusters"]);

        let updates = json["moc_updates"].as_array().unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0]["moc"], "productivity-map");
        assert_eq!(updates[0]["current_members"], 3);
        let missing = updates[0]["missing_notes"].as_array().unwrap();
        assert_eq!(missing.len(), 1);
        assert_eq!(missing[0]["slug"], "time-blocking");
        assert_eq!(missing[0]["shared_tags"], serde_json::json!(["focus"]));

        let clusters = json["new_clusters"].as_array().unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0]["size"], 3);
        assert_eq!(clusters[0]["theme"], "Habits");
        let members: Vec<_> = clusters[0]["notes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|n| n["slug"].as_str().unwrap())
            .collect();
        assert_eq!(members, vec!["habit-loops", "habit-stacking", "tiny-habits"]);
    }

    #[test]
    fn test_curate_modes_emit_only_their_sections() {
        let fx = corpus();

        let gaps = curate_json(&fx, &curate_args(CurateMode::MocGaps));
        assert_eq!(keys(&gaps), vec!["moc_updates"]);

        let clusters = curate_json(&fx, &curate_args(CurateMode::NewClusters));
        assert_eq!(keys(&clusters), vec!["new_clusters"]);
    }

    #[test]
    fn test_curate_for_note_suggests_page() {
        let fx = corpus();
        let mut args = curate_args(CurateMode::ForNote);
        args.note = Some("time-blocking".to_string());

        let json = curate_json(&fx, &args);
        assert_eq!(keys(&json), vec!["for_note"]);
        let suggestions = json["for_note"].as_array().unwrap();
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0]["moc"], "productivity-map");
        assert_eq!(suggestions[0]["moc_title"], "Productivity");
        assert!(suggestions[0]["reason"]
            .as_str()
            .unwrap()
            .starts_with("shares tags: focus; semantic similarity: 90%"));
    }

    #[test]
    fn test_curate_for_note_already_linked_has_no_suggestions() {
        let fx = corpus();
        let mut args = curate_args(CurateMode::ForNote);
        args.note = Some("deep-work".to_string());

        let json = curate_json(&fx, &args);
        assert_eq!(json["for_note"], serde_json::json!([]));
    }

    #[test]
    fn test_curate_unknown_note_fails_before_embedding() {
        let fx = corpus();
        let mut args = curate_args(CurateMode::ForNote);
        args.note = Some("no-such-note".to_string());

        let command = CurateCommand::new(&args, &fx.config).unwrap();
        let result = command.execute(&fx.repo(), &mut fx.store(), &FileLinks);

        assert!(matches!(result, Err(CliError::NoteNotFound(slug)) if slug == "no-such-note"));
        assert_eq!(fx.provider.calls.get(), 0);
    }

    #[test]
    fn test_curate_second_run_uses_cache() {
        let fx = corpus();
        curate_json(&fx, &curate_args(CurateMode::Full));
        assert_eq!(fx.provider.calls.get(), 1);

        curate_json(&fx, &curate_args(CurateMode::Full));
        assert_eq!(fx.provider.calls.get(), 1);
    }

    #[test]
    fn test_curate_empty_content_dir_is_an_error() {
        let fx = corpus();
        let empty = fx.tmp.path().join("empty");
        std::fs::create_dir_all(&empty).unwrap();

        let command = CurateCommand::new(&curate_args(CurateMode::Full), &fx.config).unwrap();
        let result = command.execute(&NoteRepository::new(&empty), &mut fx.store(), &FileLinks);
        assert!(matches!(
            result,
            Err(CliError::Notes(crate::notes::NoteError::NoNotes(_)))
        ));
    }

    #[test]
    fn test_command_line_overrides_config() {
        let fx = corpus();
        let mut args = curate_args(CurateMode::Full);

        let from_config = CurateCommand::new(&args, &fx.config).unwrap();
        assert_eq!(from_config.threshold, 0.7);
        assert_eq!(from_config.eps, 0.3);
        assert_eq!(from_config.min_cluster_size, 3);

        args.threshold = Some(0.5);
        args.eps = Some(0.2);
        args.min_cluster_size = Some(4);
        let overridden = CurateCommand::new(&args, &fx.config).unwrap();
        assert_eq!(overridden.threshold, 0.5);
        assert_eq!(overridden.eps, 0.2);
        assert_eq!(overridden.min_cluster_size, 4);
    }

    #[test]
    fn test_curate_argument_validation() {
        let fx = corpus();

        let missing_note = curate_args(CurateMode::ForNote);
        assert!(matches!(
            CurateCommand::new(&missing_note, &fx.config),
            Err(CliError::Validation { field, .. }) if field == "note"
        ));

        let mut bad_threshold = curate_args(CurateMode::Full);
        bad_threshold.threshold = Some(1.5);
        assert!(CurateCommand::new(&bad_threshold, &fx.config).is_err());

        let mut bad_eps = curate_args(CurateMode::NewClusters);
        bad_eps.eps = Some(0.0);
        assert!(CurateCommand::new(&bad_eps, &fx.config).is_err());

        let mut bad_size = curate_args(CurateMode::NewClusters);
        bad_size.min_cluster_size = Some(0);
        assert!(CurateCommand::new(&bad_size, &fx.config).is_err());
    }

    #[test]
    fn test_mixed_case_filenames_resolve_as_linked() {
        let fx = corpus();
        let content = fx.tmp.path().join("mixed");
        std::fs::create_dir_all(&content).unwrap();
        write_note(
            &content,
            "Productivity",
            "title: Productivity\ntype: map",
            "[[Deep-Work]] [[Flow]] [[focus mode]]\n",
        );
        write_note(&content, "Deep-Work", "title: Deep Work", "");
        write_note(&content, "Flow", "title: Flow", "");
        write_note(&content, "Focus Mode", "title: Focus Mode", "");
        write_note(&content, "Time-Blocking", "title: Time Blocking", "");
        let repo = NoteRepository::new(&content);

        let all_notes = repo.load_all().unwrap();
        let pages: Vec<&Note> = all_notes.iter().filter(|n| n.is_index_page()).collect();
        let unlinked: Vec<_> = orphans(&all_notes, &pages, &FileLinks)
            .into_iter()
            .map(|n| n.slug.as_str())
            .collect();
        assert_eq!(unlinked, vec!["time-blocking"]);

        let command = CurateCommand::new(&curate_args(CurateMode::MocGaps), &fx.config).unwrap();
        let report = command.execute(&repo, &mut fx.store(), &FileLinks).unwrap();
        let updates = report.moc_updates.unwrap();
        assert_eq!(updates.len(), 1);
        assert_eq!(updates[0].page, "productivity");
        assert_eq!(updates[0].current_members, 3);
        assert_eq!(updates[0].missing[0].slug, "time-blocking");
    }

    #[test]
    fn test_for_note_accepts_filename_form() {
        let fx = corpus();
        let mut args = curate_args(CurateMode::ForNote);
        args.note = Some("Time Blocking".to_string());

        let command = CurateCommand::new(&args, &fx.config).unwrap();
        assert_eq!(command.note.as_deref(), Some("time-blocking"));
    }
}

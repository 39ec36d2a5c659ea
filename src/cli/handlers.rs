use anyhow::Result;

use crate::{
    cli::{
        commands::{CurateCommand, RelatedCommand},
        types::{CurateArgs, RelatedArgs},
    },
    config::Config,
    notes::{FileLinks, NoteRepository},
    semantic::{EmbeddingModel, EmbeddingProvider, EmbeddingStore, ProviderFactory},
};

pub fn handle_related(args: RelatedArgs, config: &Config) -> Result<()> {
    let command = RelatedCommand::new(&args, config)?;
    let repo = NoteRepository::new(&config.content_dir);
    let mut store = open_store(config, args.rebuild_cache);

    let report = command.execute(&repo, &mut store)?;
    print!("{report}");
    Ok(())
}

pub fn handle_curate(args: CurateArgs, config: &Config) -> Result<()> {
    let command = CurateCommand::new(&args, config)?;
    let repo = NoteRepository::new(&config.content_dir);
    let mut store = open_store(config, args.rebuild_cache);

    let report = command.execute(&repo, &mut store, &FileLinks)?;
    println!("{}", report.to_json()?);
    Ok(())
}

/// Embedding store backed by the configured fastembed model, loaded on first use.
fn open_store(config: &Config, rebuild: bool) -> EmbeddingStore {
    let model_name = config.embedding.model.clone();
    let base_path = config.base_path().to_path_buf();
    let show_download_progress = config.embedding.show_download_progress;

    let factory: ProviderFactory = Box::new(move || {
        let model = EmbeddingModel::new(&model_name, base_path, show_download_progress)?;
        Ok(Box::new(model) as Box<dyn EmbeddingProvider>)
    });

    let mut store = EmbeddingStore::open(config.cache_path(), &config.embedding.model, factory);
    if rebuild {
        store.rebuild();
    }
    store
}

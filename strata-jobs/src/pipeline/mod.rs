//! The read → process → write stage shared by backups and restores.

use crate::{
    execution::Execution,
    job::{cancellation, Failure, FailureKind},
};
use std::path::Path;
use strata_core::{
    catalog::Catalog,
    layout,
    model::{Entity, Kind},
};

pub mod processor;
pub mod reader;
pub mod resources;
pub mod writer;

use processor::Verdict;
use reader::{ItemStream, ReadError};
use resources::{AdditionalResources, ResourceContext};
use writer::ItemWriter;

/// Where a job reads entities from.
#[derive(Debug, Copy, Clone)]
pub enum Source<'a> {
    Catalog(&'a Catalog),
    /// a directory in the catalog layout, such as an extracted archive
    Dir(&'a Path),
}

impl Source<'_> {
    fn open(&self, kind: Kind) -> Result<ItemStream, ReadError> {
        match self {
            Source::Catalog(catalog) => Ok(ItemStream::from_catalog(catalog, kind)),
            Source::Dir(root) => ItemStream::from_dir(root, kind),
        }
    }

    fn count(&self, kind: Kind) -> Result<usize, ReadError> {
        match self {
            Source::Catalog(catalog) => Ok(catalog.count(kind)),
            Source::Dir(root) => Ok(layout::list(root, kind)?.len()),
        }
    }
}

#[derive(Debug)]
pub enum Outcome {
    Completed,
    Stopped(cancellation::Request),
}

/// Sidecar writers together with the roots they copy between.
#[derive(Debug)]
pub struct Resources {
    ctx: ResourceContext,
    writers: Vec<Box<dyn AdditionalResources>>,
}

impl Resources {
    pub fn new(ctx: ResourceContext) -> Self {
        Resources {
            ctx,
            writers: resources::all(),
        }
    }
}

pub struct ItemStage<'a, W> {
    execution: &'a Execution,
    cancellation: &'a mut cancellation::Recv,
    writer: W,
    resources: Option<Resources>,
}

impl<'a, W: ItemWriter> ItemStage<'a, W> {
    /// `resources` is `None` when sidecar files should not be copied.
    pub fn new(
        execution: &'a Execution,
        cancellation: &'a mut cancellation::Recv,
        writer: W,
        resources: Option<Resources>,
    ) -> Self {
        ItemStage {
            execution,
            cancellation,
            writer,
            resources,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Runs every kind in [`Kind::SEQUENCE`] through the reader, processor and writer. Stop
    /// requests are checked before each entity.
    pub fn run(&mut self, source: Source<'_>) -> Result<Outcome, Failure> {
        let mut total = 0;
        for kind in Kind::SEQUENCE {
            total += source.count(kind).map_err(|e| Failure::from_error(FailureKind::Io, &e))?;
        }
        self.execution.set_total_steps(total);
        tracing::debug!(total, "processing catalog entities");

        for kind in Kind::SEQUENCE {
            let mut stream = source
                .open(kind)
                .map_err(|e| Failure::from_error(FailureKind::Io, &e))?;
            let result = self.run_kind(&mut stream);
            stream.close();
            if let Some(request) = result? {
                return Ok(Outcome::Stopped(request));
            }
        }
        Ok(Outcome::Completed)
    }

    fn run_kind(
        &mut self,
        stream: &mut ItemStream,
    ) -> Result<Option<cancellation::Request>, Failure> {
        let chunk_size = self.execution.parameters().chunk_size.max(1);
        let mut chunk = Vec::with_capacity(chunk_size);
        tracing::debug!(kind = %stream.kind(), count = stream.len(), "processing");

        loop {
            if let Some(request) = self.cancellation.try_recv() {
                tracing::debug!(reason = ?request.reason, "stop requested");
                return Ok(Some(request));
            }
            let item = match stream.next() {
                Some(item) => item,
                None => break,
            };
            self.execution.step();

            let entity = match item {
                Ok(entity) => entity,
                Err(error) => {
                    self.apply_policy(Failure::from_error(FailureKind::Io, &error))?;
                    continue;
                }
            };
            match processor::process(entity, self.writer.target()) {
                Verdict::Accept(entity) => {
                    chunk.push(entity);
                    if chunk.len() >= chunk_size {
                        self.flush(&mut chunk)?;
                    }
                }
                Verdict::Reject(rejection) => self.apply_policy(rejection.into())?,
            }
        }
        self.flush(&mut chunk)?;
        Ok(None)
    }

    fn flush(&mut self, chunk: &mut Vec<Entity>) -> Result<(), Failure> {
        let mut pending = &chunk[..];
        while !pending.is_empty() {
            let (written, error) = match self.writer.write(pending) {
                Ok(()) => (pending.len(), None),
                Err(error) => (error.index.min(pending.len() - 1), Some(error)),
            };
            for entity in &pending[..written] {
                self.write_resources(entity)?;
            }
            match error {
                Some(error) => {
                    let failure = Failure::from_error(error.failure_kind(), &error)
                        .with_entity(error.entity.clone());
                    self.apply_policy(failure)?;
                    pending = &pending[written + 1..];
                }
                None => break,
            }
        }
        chunk.clear();
        Ok(())
    }

    fn write_resources(&self, entity: &Entity) -> Result<(), Failure> {
        let resources = match &self.resources {
            Some(resources) => resources,
            None => return Ok(()),
        };
        for writer in resources.writers.iter().filter(|w| w.can_handle(entity)) {
            if let Err(error) = writer.write(&resources.ctx, entity) {
                self.apply_policy(
                    Failure::from_error(FailureKind::Io, &error).with_entity(entity.label()),
                )?;
            }
        }
        Ok(())
    }

    /// The one place strict and best-effort jobs differ: strict jobs fail on the first failure,
    /// best-effort jobs record it as a warning and carry on.
    fn apply_policy(&self, failure: Failure) -> Result<(), Failure> {
        if self.execution.parameters().best_effort {
            tracing::warn!(%failure, "skipping");
            self.execution.add_warning_exceptions([failure]);
            Ok(())
        } else {
            Err(failure)
        }
    }
}

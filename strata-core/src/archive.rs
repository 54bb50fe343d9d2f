use bzip2::{read::BzDecoder, write::BzEncoder};
use flate2::{read::GzDecoder, write::GzEncoder};
use std::{
    fs::File,
    io::{BufReader, Read, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use walkdir::WalkDir;
use zip::{write::FileOptions, CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum Scheme {
    Directory,
    Zip,
    Tar,
    Tgz,
    Tbz2,
    Gz,
    Bz2,
    Jar,
    Unknown,
}

impl Scheme {
    pub fn label(&self) -> &'static str {
        match self {
            Scheme::Directory => "file",
            Scheme::Zip => "zip",
            Scheme::Tar => "tar",
            Scheme::Tgz => "tgz",
            Scheme::Tbz2 => "tbz2",
            Scheme::Gz => "gz",
            Scheme::Bz2 => "bz2",
            Scheme::Jar => "jar",
            Scheme::Unknown => "unknown",
        }
    }

    /// Plain compressed streams hold exactly one file, never a directory tree.
    pub fn is_single_file(&self) -> bool {
        matches!(self, Scheme::Gz | Scheme::Bz2)
    }
}

impl std::fmt::Display for Scheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unsupported archive type: {}", .0.display())]
    UnsupportedArchive(PathBuf),
    #[error("target directory {} does not exist", .0.display())]
    MissingTargetDir(PathBuf),
    #[error("{} is not a directory", .0.display())]
    NotADirectory(PathBuf),
    #[error("{} must contain exactly one file to be compressed as {1}", .0.display())]
    NotSingleFile(PathBuf, Scheme),
    #[error("I/O error on {}", .0.display())]
    Io(PathBuf, #[source] std::io::Error),
    #[error("error walking {}", .0.display())]
    Walk(PathBuf, #[source] walkdir::Error),
    #[error("invalid zip archive {}", .0.display())]
    Zip(PathBuf, #[source] zip::result::ZipError),
    #[error("archive task failed")]
    TaskFailed(#[from] tokio::task::JoinError),
}

/// Infers the scheme of `path`: existing directories are [`Scheme::Directory`], everything else
/// goes by its (case-insensitive) extension.
pub fn resolve_scheme(path: &Path) -> Scheme {
    if path.is_dir() {
        return Scheme::Directory;
    }
    let name = match path.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_lowercase(),
        None => return Scheme::Unknown,
    };

    const SUFFIXES: [(&str, Scheme); 11] = [
        (".tar.gz", Scheme::Tgz),
        (".tar.bz2", Scheme::Tbz2),
        (".tar.bzip2", Scheme::Tbz2),
        (".tgz", Scheme::Tgz),
        (".tbz2", Scheme::Tbz2),
        (".zip", Scheme::Zip),
        (".kmz", Scheme::Zip),
        (".jar", Scheme::Jar),
        (".tar", Scheme::Tar),
        (".gz", Scheme::Gz),
        (".bz2", Scheme::Bz2),
    ];
    SUFFIXES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map_or(Scheme::Unknown, |(_, scheme)| *scheme)
}

/// A file or directory together with the scheme inferred from it when the handle was created.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct ArchiveHandle {
    path: PathBuf,
    scheme: Scheme,
}

impl ArchiveHandle {
    pub fn resolve(path: impl Into<PathBuf>) -> Result<Self, Error> {
        let path = path.into();
        match resolve_scheme(&path) {
            Scheme::Unknown => Err(Error::UnsupportedArchive(path)),
            scheme => Ok(Self { path, scheme }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

impl std::fmt::Display for ArchiveHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.scheme, self.path.display())
    }
}

fn open(path: &Path) -> Result<BufReader<File>, Error> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|e| Error::Io(path.to_owned(), e))
}

fn write_stream(mut reader: impl Read, target: &Path) -> Result<(), Error> {
    let mut out = File::create(target).map_err(|e| Error::Io(target.to_owned(), e))?;
    std::io::copy(&mut reader, &mut out).map_err(|e| Error::Io(target.to_owned(), e))?;
    Ok(())
}

/// Unpacks `archive` into `target`, which must already exist.
pub fn extract(archive: &ArchiveHandle, target: &Path) -> Result<(), Error> {
    if !target.is_dir() {
        return Err(Error::MissingTargetDir(target.to_owned()));
    }
    let path = archive.path();
    tracing::debug!(%archive, target = %target.display(), "extracting");

    let unpack_tar = |reader: Box<dyn Read>| {
        tar::Archive::new(reader)
            .unpack(target)
            .map_err(|e| Error::Io(path.to_owned(), e))
    };
    let single_file_target = || {
        target.join(
            path.file_stem()
                .map(ToOwned::to_owned)
                .unwrap_or_else(|| "archive".into()),
        )
    };

    match archive.scheme() {
        Scheme::Directory => copy_tree(path, target),
        Scheme::Zip | Scheme::Jar => {
            let mut zip = ZipArchive::new(open(path)?).map_err(|e| Error::Zip(path.to_owned(), e))?;
            zip.extract(target)
                .map_err(|e| Error::Zip(path.to_owned(), e))
        }
        Scheme::Tar => unpack_tar(Box::new(open(path)?)),
        Scheme::Tgz => unpack_tar(Box::new(GzDecoder::new(open(path)?))),
        Scheme::Tbz2 => unpack_tar(Box::new(BzDecoder::new(open(path)?))),
        Scheme::Gz => write_stream(GzDecoder::new(open(path)?), &single_file_target()),
        Scheme::Bz2 => write_stream(BzDecoder::new(open(path)?), &single_file_target()),
        Scheme::Unknown => Err(Error::UnsupportedArchive(path.to_owned())),
    }
}

struct Entry {
    path: PathBuf,
    name: String,
    is_dir: bool,
}

/// Everything below `source`, parents before children, named relative to `source` with `/`
/// separators.
fn entries(source: &Path) -> Result<Vec<Entry>, Error> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::Walk(source.to_owned(), e))?;
        let relative = entry
            .path()
            .strip_prefix(source)
            .map_err(|_| Error::NotADirectory(source.to_owned()))?;
        let name = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        entries.push(Entry {
            path: entry.path().to_owned(),
            name,
            is_dir: entry.file_type().is_dir(),
        });
    }
    Ok(entries)
}

fn write_zip(entries: &[Entry], out: &File, archive: &Path) -> Result<(), Error> {
    let zip_error = |e| Error::Zip(archive.to_owned(), e);
    let mut zip = ZipWriter::new(out);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in entries {
        if entry.is_dir {
            zip.add_directory(entry.name.as_str(), options)
                .map_err(zip_error)?;
        } else {
            zip.start_file(entry.name.as_str(), options)
                .map_err(zip_error)?;
            std::io::copy(&mut open(&entry.path)?, &mut zip)
                .map_err(|e| Error::Io(entry.path.clone(), e))?;
        }
    }
    zip.finish().map_err(zip_error)?;
    Ok(())
}

fn write_tar<W: Write>(entries: &[Entry], out: W, archive: &Path) -> Result<W, Error> {
    let io_error = |e| Error::Io(archive.to_owned(), e);
    let mut builder = tar::Builder::new(out);

    for entry in entries {
        if entry.is_dir {
            builder
                .append_dir(&entry.name, &entry.path)
                .map_err(io_error)?;
        } else {
            builder
                .append_path_with_name(&entry.path, &entry.name)
                .map_err(io_error)?;
        }
    }
    builder.into_inner().map_err(io_error)
}

fn single_file(entries: &[Entry], source: &Path, scheme: Scheme) -> Result<PathBuf, Error> {
    match entries {
        [entry] if !entry.is_dir => Ok(entry.path.clone()),
        _ => Err(Error::NotSingleFile(source.to_owned(), scheme)),
    }
}

/// Packs the contents of `source` into `archive`. Archives are written to a temporary file next
/// to the destination and moved into place once complete.
pub fn compress(source: &Path, archive: &ArchiveHandle) -> Result<(), Error> {
    if !source.is_dir() {
        return Err(Error::NotADirectory(source.to_owned()));
    }
    let path = archive.path();
    tracing::debug!(source = %source.display(), %archive, "compressing");

    if archive.scheme() == Scheme::Directory {
        return copy_tree(source, path);
    }
    if archive.scheme() == Scheme::Unknown {
        return Err(Error::UnsupportedArchive(path.to_owned()));
    }

    let entries = entries(source)?;
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let io_error = |e| Error::Io(path.to_owned(), e);
    let tmp = NamedTempFile::new_in(parent).map_err(|e| Error::Io(parent.to_owned(), e))?;
    let out = tmp.as_file();

    match archive.scheme() {
        Scheme::Zip | Scheme::Jar => write_zip(&entries, out, path)?,
        Scheme::Tar => {
            write_tar(&entries, out, path)?;
        }
        Scheme::Tgz => {
            let encoder = GzEncoder::new(out, flate2::Compression::default());
            write_tar(&entries, encoder, path)?
                .finish()
                .map_err(io_error)?;
        }
        Scheme::Tbz2 => {
            let encoder = BzEncoder::new(out, bzip2::Compression::default());
            write_tar(&entries, encoder, path)?
                .finish()
                .map_err(io_error)?;
        }
        Scheme::Gz => {
            let file = single_file(&entries, source, Scheme::Gz)?;
            let mut encoder = GzEncoder::new(out, flate2::Compression::default());
            std::io::copy(&mut open(&file)?, &mut encoder).map_err(io_error)?;
            encoder.finish().map_err(io_error)?;
        }
        Scheme::Bz2 => {
            let file = single_file(&entries, source, Scheme::Bz2)?;
            let mut encoder = BzEncoder::new(out, bzip2::Compression::default());
            std::io::copy(&mut open(&file)?, &mut encoder).map_err(io_error)?;
            encoder.finish().map_err(io_error)?;
        }
        Scheme::Directory | Scheme::Unknown => unreachable!("handled above"),
    }

    tmp.persist(path).map_err(|e| Error::Io(path.to_owned(), e.error))?;
    Ok(())
}

/// Recursively copies the contents of `source` into `target`, creating directories as needed and
/// overwriting existing files.
pub fn copy_tree(source: &Path, target: &Path) -> Result<(), Error> {
    if !source.is_dir() {
        return Err(Error::NotADirectory(source.to_owned()));
    }
    std::fs::create_dir_all(target).map_err(|e| Error::Io(target.to_owned(), e))?;
    for entry in entries(source)? {
        let dest = target.join(&entry.name);
        if entry.is_dir {
            std::fs::create_dir_all(&dest).map_err(|e| Error::Io(dest.clone(), e))?;
        } else {
            if let Some(parent) = dest.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Io(parent.to_owned(), e))?;
            }
            std::fs::copy(&entry.path, &dest).map_err(|e| Error::Io(dest.clone(), e))?;
        }
    }
    Ok(())
}

/// Changes [`overlay_tree`] made to its target so far.
#[derive(Debug, Default)]
struct Journal {
    created_dirs: Vec<PathBuf>,
    created_files: Vec<PathBuf>,
    /// overwritten files and where their previous contents were saved
    replaced: Vec<(PathBuf, PathBuf)>,
}

impl Journal {
    fn undo(self) {
        for (path, saved) in self.replaced.iter().rev() {
            if let Err(error) = std::fs::copy(saved, path) {
                tracing::warn!(%error, path = %path.display(), "could not put back replaced file");
            }
        }
        for path in self.created_files.iter().rev() {
            match std::fs::remove_file(path) {
                Err(error) if error.kind() != std::io::ErrorKind::NotFound => {
                    tracing::warn!(%error, path = %path.display(), "could not remove copied file");
                }
                _ => {}
            }
        }
        for path in self.created_dirs.iter().rev() {
            if let Err(error) = std::fs::remove_dir(path) {
                tracing::warn!(%error, path = %path.display(), "could not remove created directory");
            }
        }
    }
}

/// Creates `dir` and its missing parents, recording each one created.
fn create_dirs(dir: &Path, journal: &mut Journal) -> Result<(), Error> {
    let mut missing = Vec::new();
    let mut current = Some(dir);
    while let Some(path) = current {
        if path.as_os_str().is_empty() || path.exists() {
            break;
        }
        missing.push(path.to_owned());
        current = path.parent();
    }
    for path in missing.into_iter().rev() {
        std::fs::create_dir(&path).map_err(|e| Error::Io(path.clone(), e))?;
        journal.created_dirs.push(path);
    }
    Ok(())
}

fn overlay_entries(
    entries: &[Entry],
    target: &Path,
    saved: &Path,
    journal: &mut Journal,
) -> Result<(), Error> {
    create_dirs(target, journal)?;
    for entry in entries {
        let dest = target.join(&entry.name);
        if entry.is_dir {
            create_dirs(&dest, journal)?;
            continue;
        }

        if dest.is_file() {
            let backup = saved.join(&entry.name);
            if let Some(parent) = backup.parent() {
                std::fs::create_dir_all(parent).map_err(|e| Error::Io(parent.to_owned(), e))?;
            }
            std::fs::copy(&dest, &backup).map_err(|e| Error::Io(backup.clone(), e))?;
            journal.replaced.push((dest.clone(), backup));
        } else if !dest.exists() {
            journal.created_files.push(dest.clone());
        }
        std::fs::copy(&entry.path, &dest).map_err(|e| Error::Io(dest.clone(), e))?;
    }
    Ok(())
}

/// Copies the contents of `source` into `target` like [`copy_tree`], saving every file it
/// overwrites below `saved` first. If any step fails, the copy is undone: replaced files get their
/// old contents back and new files and directories are removed.
pub fn overlay_tree(source: &Path, target: &Path, saved: &Path) -> Result<(), Error> {
    if !source.is_dir() {
        return Err(Error::NotADirectory(source.to_owned()));
    }
    let entries = entries(source)?;
    let mut journal = Journal::default();
    let result = overlay_entries(&entries, target, saved, &mut journal);
    if result.is_err() {
        tracing::debug!(target = %target.display(), "undoing partial copy");
        journal.undo();
    }
    result
}

pub async fn spawn_extract(archive: ArchiveHandle, target: PathBuf) -> Result<(), Error> {
    tokio::task::spawn_blocking(move || extract(&archive, &target)).await?
}

pub async fn spawn_compress(source: PathBuf, archive: ArchiveHandle) -> Result<(), Error> {
    tokio::task::spawn_blocking(move || compress(&source, &archive)).await?
}

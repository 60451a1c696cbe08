use std::path::{Path, PathBuf};

use post_core::{FieldMap, FieldsError};
use thiserror::Error;

#[derive(Debug, Error)]
pub(crate) enum FieldsLoadError {
    #[error("failed to load fields file {path:?}: {source}")]
    Load {
        path: PathBuf,
        #[source]
        source: FieldsError,
    },
}

/// Загружает начальный снимок полей. Нет файла - ошибка старта.
pub(crate) fn load_fields(path: impl AsRef<Path>) -> Result<FieldMap, FieldsLoadError> {
    let path = path.as_ref();

    post_core::fields::read_fields_from_path(path).map_err(|source| FieldsLoadError::Load {
        path: path.to_path_buf(),
        source,
    })
}

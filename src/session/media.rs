use crate::error::ServiceError;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

/// An image file picked by the user, read into memory.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalPhoto {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Arc<[u8]>,
}

impl LocalPhoto {
    /// Read `path` and make sure it is an image we can hand to the media service.
    pub fn load(path: &Path) -> Result<Self, ServiceError> {
        let bytes = std::fs::read(path).map_err(|source| ServiceError::PhotoRead {
            path: path.display().to_string(),
            source,
        })?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "photo".to_string());
        Self::from_bytes(file_name, bytes)
    }

    pub fn from_bytes(file_name: String, bytes: Vec<u8>) -> Result<Self, ServiceError> {
        let format = image::guess_format(&bytes)
            .map_err(|_| ServiceError::UnsupportedImage(file_name.clone()))?;
        Ok(Self {
            file_name,
            mime: format.to_mime_type(),
            bytes: bytes.into(),
        })
    }
}

/// Body returned by `POST /api/upload-photo`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UploadedPhoto {
    pub url: String,
    #[serde(default)]
    pub analysis: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareStatus {
    NotShared,
    Sharing,
    Shared,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PhotoStatus {
    Uploading,
    UploadFailed,
    Uploaded {
        url: String,
        analysis: Option<String>,
        share: ShareStatus,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncidentPhoto {
    pub seq: u64,
    pub local: LocalPhoto,
    pub status: PhotoStatus,
}

impl IncidentPhoto {
    pub fn uploaded_url(&self) -> Option<&str> {
        match &self.status {
            PhotoStatus::Uploaded { url, .. } => Some(url),
            _ => None,
        }
    }

    pub fn analysis(&self) -> Option<&str> {
        match &self.status {
            PhotoStatus::Uploaded { analysis, .. } => analysis.as_deref(),
            _ => None,
        }
    }

    pub fn shared_url(&self) -> Option<&str> {
        match &self.status {
            PhotoStatus::Uploaded {
                url,
                share: ShareStatus::Shared,
                ..
            } => Some(url),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub seq: u64,
    pub photo: LocalPhoto,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ShareRequest {
    pub seq: u64,
    pub url: String,
}

/// Upload/share bookkeeping for the single tracked incident photo.
#[derive(Debug, Default)]
pub struct MediaFlow {
    photo: Option<IncidentPhoto>,
    next_seq: u64,
}

impl MediaFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn photo(&self) -> Option<&IncidentPhoto> {
        self.photo.as_ref()
    }

    pub fn is_uploading(&self) -> bool {
        matches!(
            self.photo,
            Some(IncidentPhoto {
                status: PhotoStatus::Uploading,
                ..
            })
        )
    }

    pub fn is_sharing(&self) -> bool {
        matches!(
            self.photo,
            Some(IncidentPhoto {
                status: PhotoStatus::Uploaded {
                    share: ShareStatus::Sharing,
                    ..
                },
                ..
            })
        )
    }

    pub fn can_share(&self) -> bool {
        matches!(
            self.photo,
            Some(IncidentPhoto {
                status: PhotoStatus::Uploaded {
                    share: ShareStatus::NotShared,
                    ..
                },
                ..
            })
        )
    }

    /// Start uploading `file`, replacing whatever photo was tracked before.
    /// Inert when there is no file or another upload is still pending.
    pub fn upload(&mut self, file: Option<LocalPhoto>) -> Option<UploadRequest> {
        let photo = file?;
        if self.is_uploading() {
            return None;
        }
        self.next_seq += 1;
        let seq = self.next_seq;
        self.photo = Some(IncidentPhoto {
            seq,
            local: photo.clone(),
            status: PhotoStatus::Uploading,
        });
        Some(UploadRequest { seq, photo })
    }

    /// Apply an upload result. Results for a replaced photo are dropped.
    pub fn upload_finished(
        &mut self,
        seq: u64,
        result: Result<UploadedPhoto, ServiceError>,
    ) -> bool {
        let Some(photo) = self.photo.as_mut() else {
            return false;
        };
        if photo.seq != seq || photo.status != PhotoStatus::Uploading {
            return false;
        }
        photo.status = match result {
            Ok(uploaded) => {
                log::info!("[media] photo uploaded: {}", uploaded.url);
                PhotoStatus::Uploaded {
                    url: uploaded.url,
                    analysis: uploaded.analysis,
                    share: ShareStatus::NotShared,
                }
            }
            Err(e) => {
                log::error!("[media] failed to upload image: {}", e);
                PhotoStatus::UploadFailed
            }
        };
        true
    }

    /// Begin broadcasting the uploaded photo. Inert unless there is an
    /// uploaded photo that is neither shared nor being shared.
    pub fn share(&mut self) -> Option<ShareRequest> {
        let photo = self.photo.as_mut()?;
        let seq = photo.seq;
        match &mut photo.status {
            PhotoStatus::Uploaded { url, share, .. } if *share == ShareStatus::NotShared => {
                *share = ShareStatus::Sharing;
                Some(ShareRequest {
                    seq,
                    url: url.clone(),
                })
            }
            _ => None,
        }
    }

    pub fn share_finished(&mut self, seq: u64, result: Result<(), ServiceError>) -> bool {
        let Some(photo) = self.photo.as_mut() else {
            return false;
        };
        if photo.seq != seq {
            return false;
        }
        match &mut photo.status {
            PhotoStatus::Uploaded { url, share, .. } if *share == ShareStatus::Sharing => {
                match result {
                    Ok(()) => {
                        log::info!("[media] photo shared: {}", url);
                        *share = ShareStatus::Shared;
                    }
                    Err(e) => {
                        log::error!("[media] failed to share image: {}", e);
                        *share = ShareStatus::NotShared;
                    }
                }
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    // Smallest valid PNG header is enough for format sniffing.
    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0, 0, 0, 0];

    fn photo(name: &str) -> LocalPhoto {
        LocalPhoto::from_bytes(name.to_string(), PNG_MAGIC.to_vec()).unwrap()
    }

    fn uploaded(url: &str) -> Result<UploadedPhoto, ServiceError> {
        Ok(UploadedPhoto {
            url: url.to_string(),
            analysis: Some("NO VISIBLE FIRE".to_string()),
        })
    }

    #[test]
    fn upload_without_file_is_inert() {
        let mut flow = MediaFlow::new();
        assert!(flow.upload(None).is_none());
        assert!(flow.photo().is_none());
    }

    #[test]
    fn share_before_upload_resolves_is_inert() {
        let mut flow = MediaFlow::new();
        let req = flow.upload(Some(photo("crash.png"))).unwrap();
        assert!(flow.share().is_none());

        assert!(flow.upload_finished(req.seq, uploaded("/uploads/crash.png")));
        let share = flow.share().expect("share becomes available");
        assert_eq!(share.url, "/uploads/crash.png");
        assert!(flow.share().is_none());
    }

    #[test]
    fn double_share_produces_one_request() {
        let mut flow = MediaFlow::new();
        let req = flow.upload(Some(photo("a.png"))).unwrap();
        flow.upload_finished(req.seq, uploaded("/u/a.png"));

        let first = flow.share();
        let second = flow.share();
        assert!(first.is_some());
        assert!(second.is_none());
        assert!(flow.is_sharing());
    }

    #[test]
    fn second_upload_while_pending_is_inert() {
        let mut flow = MediaFlow::new();
        let first = flow.upload(Some(photo("a.png"))).unwrap();
        assert!(flow.upload(Some(photo("b.png"))).is_none());
        assert_eq!(flow.photo().unwrap().seq, first.seq);
        assert_eq!(flow.photo().unwrap().local.file_name, "a.png");
    }

    #[test]
    fn failed_upload_records_nothing_and_allows_retry() {
        let mut flow = MediaFlow::new();
        let req = flow.upload(Some(photo("a.png"))).unwrap();
        flow.upload_finished(
            req.seq,
            Err(ServiceError::Status {
                endpoint: "/api/upload-photo",
                status: 500,
            }),
        );

        let current = flow.photo().unwrap().clone();
        assert_eq!(current.status, PhotoStatus::UploadFailed);
        assert!(current.uploaded_url().is_none());
        assert!(flow.share().is_none());

        let retry = flow.upload(Some(current.local));
        assert!(retry.is_some());
    }

    #[test]
    fn new_file_resets_uploaded_and_shared_state() {
        let mut flow = MediaFlow::new();
        let req = flow.upload(Some(photo("a.png"))).unwrap();
        flow.upload_finished(req.seq, uploaded("/u/a.png"));
        let share = flow.share().unwrap();
        flow.share_finished(share.seq, Ok(()));
        assert_eq!(flow.photo().unwrap().shared_url(), Some("/u/a.png"));

        flow.upload(Some(photo("b.png"))).unwrap();
        let current = flow.photo().unwrap();
        assert_eq!(current.local.file_name, "b.png");
        assert!(current.uploaded_url().is_none());
        assert!(current.shared_url().is_none());
        assert!(current.analysis().is_none());
    }

    #[test]
    fn pending_share_of_replaced_photo_is_dropped() {
        let mut flow = MediaFlow::new();
        let req = flow.upload(Some(photo("a.png"))).unwrap();
        flow.upload_finished(req.seq, uploaded("/u/a.png"));
        let old_share = flow.share().unwrap();

        let new_req = flow.upload(Some(photo("b.png"))).unwrap();
        assert!(!flow.share_finished(old_share.seq, Ok(())));
        assert!(!flow.upload_finished(req.seq, uploaded("/u/stale.png")));

        flow.upload_finished(new_req.seq, uploaded("/u/b.png"));
        let current = flow.photo().unwrap();
        assert_eq!(current.uploaded_url(), Some("/u/b.png"));
        assert!(current.shared_url().is_none());
    }

    #[test]
    fn failed_share_can_be_retried() {
        let mut flow = MediaFlow::new();
        let req = flow.upload(Some(photo("a.png"))).unwrap();
        flow.upload_finished(req.seq, uploaded("/u/a.png"));
        let share = flow.share().unwrap();
        flow.share_finished(
            share.seq,
            Err(ServiceError::Status {
                endpoint: "/api/data",
                status: 502,
            }),
        );

        assert!(flow.photo().unwrap().shared_url().is_none());
        assert!(flow.can_share());
        assert!(flow.share().is_some());
    }

    #[test]
    fn load_rejects_non_images() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"just some notes").unwrap();
        let err = LocalPhoto::load(file.path()).unwrap_err();
        assert!(matches!(err, ServiceError::UnsupportedImage(_)));
    }

    #[test]
    fn load_reads_image_and_sniffs_mime() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(PNG_MAGIC).unwrap();
        let loaded = LocalPhoto::load(file.path()).unwrap();
        assert_eq!(loaded.mime, "image/png");
        assert!(loaded.file_name.ends_with(".png"));
    }

    #[test]
    fn load_reports_missing_file() {
        let err = LocalPhoto::load(Path::new("/definitely/not/here.png")).unwrap_err();
        assert!(matches!(err, ServiceError::PhotoRead { .. }));
    }
}

//! A small uploader for sharing a file through a public image API.
//!
//! The user picks a file, the file is checked against a size limit (2 MiB by
//! default), posted to the upload API as multipart form data, and the id that
//! comes back is turned into a public link to the stored object.  Uploaded
//! files live for two days.
//!
//! The pieces:
//!
//! * [`UploadWidget`] holds the selection and the upload state and maps them
//!   to a [`View`].  It is the thing a front-end drives.
//! * [`UploadClient`] performs the HTTP request.  It implements [`UploadApi`],
//!   which is the seam to substitute when testing or using another transport.
//! * [`UploaderConfig`] says where to upload to and where the files end up.
//!
//! [`UploadWidget`]: crate::widget::UploadWidget
//! [`View`]: crate::widget::View
//! [`UploadClient`]: crate::client::UploadClient
//! [`UploadApi`]: crate::client::UploadApi
//! [`UploaderConfig`]: crate::config::UploaderConfig
//!
//! ```ignore
//! use std::sync::Arc;
//!
//! use image_uploader::client::UploadClient;
//! use image_uploader::config::UploaderConfig;
//! use image_uploader::file::SelectedFile;
//! use image_uploader::widget::{UploadState, UploadWidget};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = UploaderConfig::from_env()?;
//!     let widget = UploadWidget::new(config.clone(), Arc::new(UploadClient::new(&config)));
//!
//!     widget.select_file(SelectedFile::from_path("holiday.jpg").await?);
//!     if widget.oversize_warning() {
//!         println!("{}", widget.render().picker.limit_hint());
//!         return Ok(());
//!     }
//!
//!     match widget.submit().await? {
//!         UploadState::Done => println!("{}", widget.result_link().unwrap()),
//!         _ => println!("{}", widget.failure().unwrap_or_default()),
//!     }
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod file;
pub mod widget;

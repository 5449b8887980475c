//! Transfer failures and session lifecycle.

use std::sync::Arc;

use tokio::io::AsyncReadExt;
use unifs::{
    CloseMode, ConnectionState, FileSystem, FileType, FsError, FtpFileSystem, LocalFileSystem,
    SftpFileSystem,
};
use unifs_testutil::{MemoryFtpClient, MemorySftpClient, MemoryTree, failing_reader, payload};

fn ftp() -> (FtpFileSystem, MemoryFtpClient) {
    let client = MemoryFtpClient::new(Arc::new(MemoryTree::new()));
    (FtpFileSystem::from_client(client.clone()), client)
}

fn sftp() -> (SftpFileSystem, MemorySftpClient) {
    let client = MemorySftpClient::new(Arc::new(MemoryTree::new()));
    (SftpFileSystem::from_client(client.clone()), client)
}

fn assert_not_connected<T: std::fmt::Debug>(result: Result<T, FsError>) {
    match result {
        Err(FsError::NotConnected { state }) => assert_eq!(state, ConnectionState::Closed),
        other => panic!("expected NotConnected, got {other:?}"),
    }
}

#[tokio::test]
async fn test_ftp_get_fails_when_transfer_breaks() {
    let (fs, client) = ftp();
    client.tree().insert_file("/big.bin", payload(100_000));
    client.fail_transfers_after(4096);

    let err = fs.get("/big.bin").await.unwrap_err();
    assert!(matches!(err, FsError::Io { .. }), "{err:?}");
}

#[tokio::test]
async fn test_ftp_stream_reports_late_failure_as_read_error() {
    let (fs, client) = ftp();
    client.tree().insert_file("/big.bin", payload(100_000));
    client.fail_transfers_after(10);

    let mut stream = fs.read_to_stream("/big.bin").await.unwrap();
    let mut buf = Vec::new();
    let err = stream.read_to_end(&mut buf).await.unwrap_err();
    assert_eq!(err.kind(), std::io::ErrorKind::ConnectionReset);
    assert_eq!(buf, payload(100_000)[..10]);
}

#[tokio::test]
async fn test_sftp_stream_reports_late_failure_as_read_error() {
    let (fs, client) = sftp();
    client.tree().insert_file("/big.bin", payload(50_000));
    client.fail_transfers_after(0);

    let mut stream = fs.read_to_stream("/big.bin").await.unwrap();
    let mut buf = Vec::new();
    assert!(stream.read_to_end(&mut buf).await.is_err());
    assert!(buf.is_empty());

    let mut sink = Vec::new();
    let err = fs.read_into("/big.bin", &mut sink).await.unwrap_err();
    assert!(matches!(err, FsError::Io { .. }), "{err:?}");
}

#[tokio::test]
async fn test_put_with_failing_source_is_io_error() {
    let (ftp_fs, ftp_client) = ftp();
    let err = ftp_fs
        .put(failing_reader(b"partial".to_vec(), "source gone"), "/f")
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::Io { .. }), "{err:?}");
    assert_eq!(ftp_client.tree().kind("/f"), None);

    let (sftp_fs, _) = sftp();
    let err = sftp_fs
        .put(failing_reader(Vec::new(), "source gone"), "/f")
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::Io { .. }), "{err:?}");

    let dir = tempfile::tempdir().unwrap();
    let local = LocalFileSystem::rooted(dir.path());
    let err = local
        .put(failing_reader(b"partial".to_vec(), "source gone"), "/f")
        .await
        .unwrap_err();
    assert!(matches!(err, FsError::Io { .. }), "{err:?}");
}

#[tokio::test]
async fn test_put_into_missing_directory_fails() {
    let (fs, _) = ftp();
    let err = fs.put_bytes(b"x".to_vec(), "/no/such/dir/f").await.unwrap_err();
    assert!(matches!(err, FsError::Io { .. }), "{err:?}");

    let (fs, _) = sftp();
    let err = fs.put_bytes(b"x".to_vec(), "/no/such/dir/f").await.unwrap_err();
    assert!(matches!(err, FsError::Io { .. }), "{err:?}");

    let dir = tempfile::tempdir().unwrap();
    let fs = LocalFileSystem::rooted(dir.path());
    let err = fs.put_bytes(b"x".to_vec(), "/no/such/dir/f").await.unwrap_err();
    assert!(matches!(err, FsError::Io { .. }), "{err:?}");
}

#[tokio::test]
async fn test_ftp_root_always_exists() {
    let (fs, _) = ftp();
    assert_eq!(fs.exists("/").await.unwrap(), Some(FileType::Directory));
    assert!(fs.list("/").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_ftp_exists_surfaces_server_failure() {
    let (fs, client) = ftp();
    client.tree().insert_file("/f", "x");

    client.fail_next_with(421);
    let err = fs.exists("/f").await.unwrap_err();
    assert!(matches!(err, FsError::Protocol { code: Some(421), .. }), "{err:?}");

    // a 550 on the parent still means absent
    client.fail_next_with(550);
    assert_eq!(fs.exists("/f").await.unwrap(), None);
    assert_eq!(fs.exists("/f").await.unwrap(), Some(FileType::File));
}

#[tokio::test]
async fn test_sftp_exists_surfaces_server_failure() {
    let (fs, client) = sftp();
    client.tree().insert_file("/f", "x");

    client.fail_next_with(4);
    let err = fs.exists("/f").await.unwrap_err();
    assert!(matches!(err, FsError::Protocol { code: Some(4), .. }), "{err:?}");

    client.fail_next_with(3);
    let err = fs.exists("/f").await.unwrap_err();
    assert!(matches!(err, FsError::Io { .. }), "{err:?}");

    assert_eq!(fs.exists("/f").await.unwrap(), Some(FileType::File));
}

#[tokio::test]
async fn test_rename_refused_for_other_reasons_blames_source() {
    let (fs, client) = sftp();
    client.tree().insert_file("/a", "x");

    client.fail_next_with(4);
    let err = fs.rename("/a", "/b").await.unwrap_err();
    assert!(matches!(err, FsError::Protocol { code: Some(4), .. }), "{err:?}");
    assert_eq!(fs.exists("/a").await.unwrap(), Some(FileType::File));
}

#[tokio::test]
async fn test_ftp_operations_after_close_are_rejected() {
    let (fs, client) = ftp();
    assert_eq!(fs.state(), ConnectionState::Ready);
    fs.close().await.unwrap();
    assert_eq!(fs.state(), ConnectionState::Closed);

    assert_not_connected(fs.list("/").await);
    assert_not_connected(fs.exists("/a").await);
    assert_not_connected(fs.get("/a").await);
    assert_not_connected(fs.put_bytes(Vec::new(), "/a").await);
    assert_not_connected(fs.mkdir("/a", true).await);
    assert_not_connected(fs.rmdir("/a", true).await);
    assert_not_connected(fs.delete("/a").await);
    assert_not_connected(fs.rename("/a", "/b").await);
    assert!(matches!(
        fs.read_to_stream("/a").await,
        Err(FsError::NotConnected { .. })
    ));

    fs.close().await.unwrap();
    assert_eq!(client.end_calls(), 1);
}

#[tokio::test]
async fn test_sftp_operations_after_close_are_rejected() {
    let (fs, client) = sftp();
    fs.close().await.unwrap();
    assert_not_connected(fs.list("/").await);
    assert_not_connected(fs.exists("/a").await);
    assert_not_connected(fs.mkdir("/a", false).await);

    fs.close().await.unwrap();
    assert_eq!(client.end_calls(), 1);
    assert_eq!(fs.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_ftp_forced_close_skips_quit() {
    let (fs, client) = ftp();
    fs.close_with(CloseMode::Force).await.unwrap();
    assert_eq!(client.end_calls(), 0);
    assert_eq!(client.destroy_calls(), 1);
    assert_eq!(fs.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_ftp_failed_quit_still_closes() {
    let (fs, client) = ftp();
    client.fail_quit();
    fs.close().await.unwrap();
    assert_eq!(client.end_calls(), 1);
    assert_eq!(client.destroy_calls(), 1);
    assert_eq!(fs.state(), ConnectionState::Closed);
}

#[tokio::test]
async fn test_recursive_mkdir_through_file_fails() {
    let (fs, client) = ftp();
    client.tree().insert_file("/a/file", "x");
    let err = fs.mkdir("/a/file/sub", true).await.unwrap_err();
    assert!(matches!(err, FsError::NotADirectory { ref path } if path == "/a/file"));

    let (fs, client) = sftp();
    client.tree().insert_file("/a/file", "x");
    let err = fs.mkdir("/a/file/sub", false).await.unwrap_err();
    assert!(matches!(err, FsError::NotADirectory { ref path } if path == "/a/file"));
}

#[tokio::test]
async fn test_unknown_listing_kind_is_file() {
    use unifs::{FileInfo, FtpFileInfo, FtpListing};

    let info = FtpFileInfo::new(FtpListing {
        name: "pipe".into(),
        size: 0,
        kind: 'p',
    });
    assert_eq!(info.file_type(), FileType::File);
}

//! Serialises a `ConfigFile` to a commented INI document.

use super::defaults::MAX_ATTEMPTS_LIMIT;
use super::settings::ConfigFile;

pub(super) fn to_config_string(config: &ConfigFile) -> String {
    let archive_dir = config
        .archive
        .directory
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_default();
    let max_age = config
        .archive
        .max_age_secs
        .map(|s| s.to_string())
        .unwrap_or_default();
    let url = config.download.url.clone().unwrap_or_default();

    format!(
        r#"[cache]
; Maximum number of tiles kept in memory
capacity = {capacity}
; Free raster buffers kept for reuse
pool_buffers = {pool_buffers}
; Namespace for tile keys; tiles from different sources never share entries
namespace = {namespace}

[network]
; Allow providers that need the network (true/false)
use_data_connection = {use_data}

[archive]
; Local tile archive laid out as <directory>/<namespace>/<z>/<x>/<y>.<extension>
; Leave empty to disable
directory = {archive_dir}
extension = {extension}
; Archived tiles older than this many seconds are served as expired and refreshed
max_age = {max_age}
threads = {archive_threads}
queue_size = {archive_queue}
min_zoom = {archive_min}
max_zoom = {archive_max}

[download]
; URL template: {{z}} {{x}} {{y}} {{s}} (mirror) {{quadkey}}
; Leave empty to disable downloading
url = {url}
; Comma-separated values substituted for {{s}}, rotated between attempts
mirrors = {mirrors}
threads = {download_threads}
queue_size = {download_queue}
; Attempts per tile including the first (1-{attempts_limit})
max_attempts = {max_attempts}
; Request timeout in seconds
timeout = {timeout}
min_zoom = {download_min}
max_zoom = {download_max}
user_agent = {user_agent}

[logging]
directory = {log_dir}
file = {log_file}
"#,
        capacity = config.cache.capacity,
        pool_buffers = config.cache.pool_buffers,
        namespace = config.cache.namespace,
        use_data = config.network.use_data_connection,
        archive_dir = archive_dir,
        extension = config.archive.extension,
        max_age = max_age,
        archive_threads = config.archive.threads,
        archive_queue = config.archive.queue_size,
        archive_min = config.archive.min_zoom,
        archive_max = config.archive.max_zoom,
        url = url,
        mirrors = config.download.mirrors.join(","),
        download_threads = config.download.threads,
        download_queue = config.download.queue_size,
        attempts_limit = MAX_ATTEMPTS_LIMIT,
        max_attempts = config.download.max_attempts,
        timeout = config.download.timeout_secs,
        download_min = config.download.min_zoom,
        download_max = config.download.max_zoom,
        user_agent = config.download.user_agent,
        log_dir = config.logging.directory.display(),
        log_file = config.logging.file,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writes_every_section() {
        let out = to_config_string(&ConfigFile::default());
        for section in ["[cache]", "[network]", "[archive]", "[download]", "[logging]"] {
            assert!(out.contains(section), "missing {section}");
        }
        assert!(out.contains("capacity = 96"));
        assert!(out.contains("url = \n"));
        assert!(out.contains("{z} {x} {y} {s} (mirror) {quadkey}"));
    }
}

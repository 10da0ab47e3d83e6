//! Registered media types for registry artifacts.
//!
//! Callers feed these into `Accept` and `content-type` headers when fetching
//! or uploading manifests and blobs. Values are the exact registered strings
//! for both the legacy Docker family and the OCI family.

/// Docker image manifest, schema 1.
pub const MANIFEST_SCHEMA1: &str = "application/vnd.docker.distribution.manifest.v1+json";

/// Docker image manifest, schema 1, with an embedded JWS signature.
pub const MANIFEST_SCHEMA1_SIGNED: &str =
    "application/vnd.docker.distribution.manifest.v1+prettyjws";

/// Docker image manifest, schema 2.
pub const MANIFEST_SCHEMA2: &str = "application/vnd.docker.distribution.manifest.v2+json";

/// Docker manifest list ("fat manifest").
pub const MANIFEST_LIST: &str = "application/vnd.docker.distribution.manifest.list.v2+json";

/// Docker image layer, gzipped tarball.
pub const LAYER: &str = "application/vnd.docker.image.rootfs.diff.tar.gzip";

/// Docker foreign (non-distributable) layer.
pub const FOREIGN_LAYER: &str = "application/vnd.docker.image.rootfs.foreign.diff.tar.gzip";

/// Docker image configuration blob.
pub const CONFIG_JSON: &str = "application/vnd.docker.container.image.v1+json";

/// OCI image manifest.
pub const OCI_MANIFEST: &str = "application/vnd.oci.image.manifest.v1+json";

/// OCI image index.
pub const OCI_IMAGE_INDEX: &str = "application/vnd.oci.image.index.v1+json";

/// OCI image layer, uncompressed tarball.
pub const OCI_LAYER: &str = "application/vnd.oci.image.layer.v1.tar";

/// OCI image layer, gzipped tarball.
pub const OCI_GZIP_LAYER: &str = "application/vnd.oci.image.layer.v1.tar+gzip";

/// OCI non-distributable layer, uncompressed tarball.
pub const OCI_NONDISTRIBUTABLE_LAYER: &str =
    "application/vnd.oci.image.layer.nondistributable.v1.tar";

/// OCI non-distributable layer, gzipped tarball.
pub const OCI_NONDISTRIBUTABLE_GZIP_LAYER: &str =
    "application/vnd.oci.image.layer.nondistributable.v1.tar+gzip";

/// OCI image configuration blob.
pub const OCI_CONFIG_JSON: &str = "application/vnd.oci.image.config.v1+json";

/// Both schema 1 manifest flavors.
pub const MANIFEST_SCHEMA1_MIMES: &[&str] = &[MANIFEST_SCHEMA1, MANIFEST_SCHEMA1_SIGNED];

/// The schema 2 manifest flavor.
pub const MANIFEST_SCHEMA2_MIMES: &[&str] = &[MANIFEST_SCHEMA2];

/// The OCI manifest flavor.
pub const OCI_MANIFEST_MIMES: &[&str] = &[OCI_MANIFEST];

/// OCI and schema 2 are compatible manifest formats.
pub const SUPPORTED_MANIFEST_MIMES: &[&str] = &[OCI_MANIFEST, MANIFEST_SCHEMA2];

/// OCI image index and Docker manifest list are compatible formats.
pub const MANIFEST_LIST_MIMES: &[&str] = &[OCI_IMAGE_INDEX, MANIFEST_LIST];

/// Layer media types indicating foreign or non-distributable content.
pub const NON_DISTRIBUTABLE_LAYER_MIMES: &[&str] = &[
    FOREIGN_LAYER,
    OCI_NONDISTRIBUTABLE_LAYER,
    OCI_NONDISTRIBUTABLE_GZIP_LAYER,
];

use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use events_deploy_core::services::ObjectStorage;
use events_deploy_core::RemoteError;

use super::{block_on, remote_error, AwsCloud};

/// `us-east-1` rejects an explicit location constraint; every other region needs one.
fn bucket_configuration(region: &str) -> Option<CreateBucketConfiguration> {
    (region != "us-east-1").then(|| {
        CreateBucketConfiguration::builder()
            .location_constraint(BucketLocationConstraint::from(region))
            .build()
    })
}

impl ObjectStorage for AwsCloud {
    fn create_bucket(&self, name: &str, region: &str) -> Result<(), RemoteError> {
        block_on(
            self.s3
                .create_bucket()
                .bucket(name)
                .set_create_bucket_configuration(bucket_configuration(region))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| remote_error("CreateBucket", error))
    }

    fn put_object(&self, bucket: &str, key: &str, body: &[u8]) -> Result<(), RemoteError> {
        block_on(
            self.s3
                .put_object()
                .bucket(bucket)
                .key(key)
                .body(ByteStream::from(body.to_vec()))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| remote_error("PutObject", error))
    }
}

use aws_sdk_dynamodb::types::{
    AttributeDefinition, BillingMode, KeySchemaElement, KeyType, ScalarAttributeType,
    TableStatus as SdkTableStatus,
};
use events_deploy_core::services::{Creation, TableService, TableStatus};
use events_deploy_core::specs::TableSpec;
use events_deploy_core::RemoteError;

use super::{block_on, error_code, remote_error, AwsCloud};

impl TableService for AwsCloud {
    fn create_table(&self, spec: &TableSpec) -> Result<Creation<()>, RemoteError> {
        const OP: &str = "CreateTable";
        let key = &spec.partition_key;
        let key_schema = KeySchemaElement::builder()
            .attribute_name(&key.name)
            .key_type(KeyType::Hash)
            .build()
            .map_err(|error| RemoteError::new(OP, error.to_string()))?;
        let attribute = AttributeDefinition::builder()
            .attribute_name(&key.name)
            .attribute_type(ScalarAttributeType::from(key.kind.as_str()))
            .build()
            .map_err(|error| RemoteError::new(OP, error.to_string()))?;

        let result = block_on(
            self.dynamodb
                .create_table()
                .table_name(&spec.name)
                .key_schema(key_schema)
                .attribute_definitions(attribute)
                .billing_mode(BillingMode::from(spec.billing_mode.as_str()))
                .send(),
        );
        match result {
            Ok(_) => Ok(Creation::Created(())),
            Err(error) if error_code(&error) == Some("ResourceInUseException") => {
                Ok(Creation::AlreadyExists)
            }
            Err(error) => Err(remote_error(OP, error)),
        }
    }

    fn table_status(&self, name: &str) -> Result<TableStatus, RemoteError> {
        let output = block_on(self.dynamodb.describe_table().table_name(name).send())
            .map_err(|error| remote_error("DescribeTable", error))?;
        let status = output.table().and_then(|table| table.table_status());
        Ok(match status {
            Some(SdkTableStatus::Active) => TableStatus::Active,
            Some(SdkTableStatus::Creating) => TableStatus::Creating,
            Some(other) => TableStatus::Other(other.as_str().to_string()),
            None => TableStatus::Other("UNKNOWN".to_string()),
        })
    }
}

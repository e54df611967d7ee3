use aws_sdk_apigateway::types::{EndpointConfiguration, EndpointType, IntegrationType};
use events_deploy_core::services::{GatewayService, RestApiSummary};
use events_deploy_core::specs::IntegrationBinding;
use events_deploy_core::RemoteError;

use super::{block_on, missing, remote_error, AwsCloud};

const PAGE_SIZE: i32 = 500;

impl GatewayService for AwsCloud {
    fn create_rest_api(&self, name: &str, description: &str) -> Result<String, RemoteError> {
        const OP: &str = "CreateRestApi";
        let output = block_on(
            self.apigateway
                .create_rest_api()
                .name(name)
                .description(description)
                .endpoint_configuration(
                    EndpointConfiguration::builder()
                        .types(EndpointType::Regional)
                        .build(),
                )
                .send(),
        )
        .map_err(|error| remote_error(OP, error))?;
        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| missing(OP, "id"))
    }

    fn root_resource_id(&self, api_id: &str) -> Result<String, RemoteError> {
        const OP: &str = "GetResources";
        let output = block_on(self.apigateway.get_resources().rest_api_id(api_id).send())
            .map_err(|error| remote_error(OP, error))?;
        output
            .items()
            .iter()
            .find(|resource| resource.path() == Some("/"))
            .and_then(|resource| resource.id())
            .map(str::to_string)
            .ok_or_else(|| missing(OP, "root resource"))
    }

    fn create_resource(
        &self,
        api_id: &str,
        parent_id: &str,
        path_part: &str,
    ) -> Result<String, RemoteError> {
        const OP: &str = "CreateResource";
        let output = block_on(
            self.apigateway
                .create_resource()
                .rest_api_id(api_id)
                .parent_id(parent_id)
                .path_part(path_part)
                .send(),
        )
        .map_err(|error| remote_error(OP, error))?;
        output
            .id()
            .map(str::to_string)
            .ok_or_else(|| missing(OP, "id"))
    }

    fn put_method(
        &self,
        api_id: &str,
        resource_id: &str,
        http_method: &str,
        authorization: &str,
    ) -> Result<(), RemoteError> {
        block_on(
            self.apigateway
                .put_method()
                .rest_api_id(api_id)
                .resource_id(resource_id)
                .http_method(http_method)
                .authorization_type(authorization)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| remote_error("PutMethod", error))
    }

    fn put_integration(
        &self,
        api_id: &str,
        resource_id: &str,
        binding: &IntegrationBinding,
    ) -> Result<(), RemoteError> {
        block_on(
            self.apigateway
                .put_integration()
                .rest_api_id(api_id)
                .resource_id(resource_id)
                .http_method(&binding.http_method)
                .r#type(IntegrationType::from(binding.integration_type.as_str()))
                .integration_http_method(&binding.integration_http_method)
                .uri(&binding.uri)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| remote_error("PutIntegration", error))
    }

    fn create_deployment(&self, api_id: &str, stage_name: &str) -> Result<(), RemoteError> {
        block_on(
            self.apigateway
                .create_deployment()
                .rest_api_id(api_id)
                .stage_name(stage_name)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| remote_error("CreateDeployment", error))
    }

    fn list_rest_apis(&self) -> Result<Vec<RestApiSummary>, RemoteError> {
        let mut apis = Vec::new();
        let mut position: Option<String> = None;
        loop {
            let output = block_on(
                self.apigateway
                    .get_rest_apis()
                    .limit(PAGE_SIZE)
                    .set_position(position.take())
                    .send(),
            )
            .map_err(|error| remote_error("GetRestApis", error))?;

            apis.extend(output.items().iter().filter_map(|api| {
                Some(RestApiSummary {
                    id: api.id()?.to_string(),
                    name: api.name().unwrap_or_default().to_string(),
                })
            }));

            match output.position() {
                Some(next) if !next.is_empty() => position = Some(next.to_string()),
                _ => return Ok(apis),
            }
        }
    }

    fn delete_rest_api(&self, api_id: &str) -> Result<(), RemoteError> {
        block_on(self.apigateway.delete_rest_api().rest_api_id(api_id).send())
            .map(|_| ())
            .map_err(|error| remote_error("DeleteRestApi", error))
    }
}

//! Server lifecycle tests over real sockets.

use cosmos_client::{ClientError, CosmosClient};
use cosmos_grpc_server::config::ServerConfig;
use cosmos_grpc_server::services::ServiceSet;
use cosmos_grpc_server::{serve, ServerError};
use cosmos_proto::cosmos::nft::v1beta1::QueryClassesRequest;
use cosmos_proto::interfaces::{ACCOUNT, FEE_ALLOWANCE};
use cosmos_proto::prost::Message;
use cosmos_proto::prost_types::FileDescriptorProto;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tonic::transport::Endpoint;
use tonic::Code;
use tonic_reflection::pb::v1::server_reflection_client::ServerReflectionClient;
use tonic_reflection::pb::v1::server_reflection_request::MessageRequest;
use tonic_reflection::pb::v1::server_reflection_response::MessageResponse;
use tonic_reflection::pb::v1::ServerReflectionRequest;

struct RunningServer {
    grpc: SocketAddr,
    http: SocketAddr,
    stop: oneshot::Sender<()>,
    handle: JoinHandle<Result<(), ServerError>>,
}

async fn start(disabled: &[&str]) -> RunningServer {
    let grpc_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let http_listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let grpc = grpc_listener.local_addr().unwrap();
    let http = http_listener.local_addr().unwrap();

    let config = ServerConfig {
        disabled_services: disabled.iter().map(|s| s.to_string()).collect(),
        ..Default::default()
    };
    let services = ServiceSet::with_reflection(config.disabled_services.clone()).unwrap();

    let (stop, stopped) = oneshot::channel::<()>();
    let handle = tokio::spawn(serve(
        config,
        services,
        grpc_listener,
        Some(http_listener),
        async move {
            let _ = stopped.await;
        },
    ));

    RunningServer {
        grpc,
        http,
        stop,
        handle,
    }
}

async fn http_get(addr: SocketAddr, path: &str) -> String {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n\r\n");
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();
    response
}

async fn reflect(addr: SocketAddr, request: MessageRequest) -> MessageResponse {
    let channel = Endpoint::from_shared(format!("http://{addr}"))
        .unwrap()
        .connect()
        .await
        .unwrap();
    let mut client = ServerReflectionClient::new(channel);
    let request = ServerReflectionRequest {
        host: String::new(),
        message_request: Some(request),
    };

    let mut responses = client
        .server_reflection_info(tokio_stream::iter([request]))
        .await
        .unwrap()
        .into_inner();
    responses
        .message()
        .await
        .unwrap()
        .unwrap()
        .message_response
        .unwrap()
}

#[tokio::test]
async fn test_grpc_reflection_lists_services() {
    let server = start(&[]).await;

    let MessageResponse::ListServicesResponse(list) =
        reflect(server.grpc, MessageRequest::ListServices(String::new())).await
    else {
        panic!("expected a service list");
    };
    let names: Vec<&str> = list.service.iter().map(|s| s.name.as_str()).collect();
    assert!(names.contains(&"cosmos.bank.v1beta1.Query"));
    assert!(names.contains(&"cosmos.staking.v1beta1.Msg"));
    assert!(names.contains(&"tendermint.abci.ABCIApplication"));
    assert!(names.len() >= 26);
}

#[tokio::test]
async fn test_grpc_reflection_resolves_messages() {
    let server = start(&[]).await;

    let response = reflect(
        server.grpc,
        MessageRequest::FileContainingSymbol("cosmos.auth.v1beta1.QueryAccountsRequest".to_string()),
    )
    .await;
    let MessageResponse::FileDescriptorResponse(files) = response else {
        panic!("expected file descriptors");
    };
    let files: Vec<FileDescriptorProto> = files
        .file_descriptor_proto
        .iter()
        .map(|bytes| FileDescriptorProto::decode(bytes.as_slice()).unwrap())
        .collect();
    let query = files
        .iter()
        .find(|file| file.name() == "cosmos/auth/v1beta1/query.proto")
        .unwrap();
    assert!(query
        .message_type
        .iter()
        .any(|message| message.name() == "QueryAccountsRequest"));
    assert!(query
        .dependency
        .iter()
        .any(|dependency| dependency == "cosmos/base/query/v1beta1/pagination.proto"));

    let response = reflect(
        server.grpc,
        MessageRequest::FileContainingSymbol("cosmos.nope.v1.Missing".to_string()),
    )
    .await;
    assert!(matches!(response, MessageResponse::ErrorResponse(_)));
}

#[tokio::test]
async fn test_reflection_over_the_wire() {
    let server = start(&[]).await;
    let client = CosmosClient::connect(format!("http://{}", server.grpc))
        .await
        .unwrap();

    let interfaces = client.interfaces().await.unwrap();
    assert!(interfaces.contains(&ACCOUNT.to_string()));

    let allowances = client.implementations(FEE_ALLOWANCE).await.unwrap();
    assert_eq!(allowances.len(), 3);

    let unknown = client.implementations("cosmos.nope.v1.Thing").await.unwrap();
    assert!(unknown.is_empty());

    let err = client.implementations("").await.unwrap_err();
    assert!(matches!(err, ClientError::Grpc { code: Code::InvalidArgument, .. }));
}

#[tokio::test]
async fn test_default_services_are_unimplemented() {
    let server = start(&[]).await;
    let client = CosmosClient::connect(format!("http://{}", server.grpc))
        .await
        .unwrap();

    let err = client.balance("cosmos1xyz", "uatom").await.unwrap_err();
    assert!(matches!(
        err,
        ClientError::Unimplemented(msg) if msg == "Method cosmos.bank.v1beta1.Query/Balance is unimplemented"
    ));

    let err = client.latest_height().await.unwrap_err();
    assert!(matches!(err, ClientError::Unimplemented(msg) if msg.contains("GetLatestBlock")));
}

#[tokio::test]
async fn test_disabled_service_is_not_routed() {
    let server = start(&["cosmos.nft.v1beta1.Query"]).await;
    let client = CosmosClient::connect(format!("http://{}", server.grpc))
        .await
        .unwrap();

    let status = client
        .nft()
        .classes(QueryClassesRequest::default())
        .await
        .unwrap_err();
    assert_eq!(status.code(), Code::Unimplemented);
    assert!(!status.message().contains("cosmos.nft.v1beta1.Query/Classes"));
}

#[tokio::test]
async fn test_http_catalog() {
    let server = start(&["cosmos.nft.v1beta1.Query"]).await;

    let health = http_get(server.http, "/health").await;
    assert!(health.starts_with("HTTP/1.1 200"));
    assert!(health.contains(r#""disabled":1"#));

    let service = http_get(server.http, "/services/cosmos.tx.v1beta1.Service").await;
    assert!(service.starts_with("HTTP/1.1 200"));
    assert!(service.contains(r#""name":"GetTxsEvent""#));

    let missing = http_get(server.http, "/services/cosmos.nope.v1.Query").await;
    assert!(missing.starts_with("HTTP/1.1 404"));
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let server = start(&[]).await;
    let client = CosmosClient::connect(format!("http://{}", server.grpc))
        .await
        .unwrap();
    assert!(!client.interfaces().await.unwrap().is_empty());
    drop(client);

    server.stop.send(()).unwrap();
    let result = server.handle.await.unwrap();
    assert!(result.is_ok());

    assert!(TcpStream::connect(server.http).await.is_err());
}

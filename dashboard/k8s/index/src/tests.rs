use super::*;
use appdash_core::{
    ApplicationEndpoint, ApplicationIngress, DeploymentStatus, DiscoverEndpoints, JoinError,
    LookupError,
};
use appdash_k8s_api::{
    api::{
        apps::v1::{DeploymentSpec, DeploymentStatus as K8sDeploymentStatus},
        core::v1::{Container, PodSpec, PodTemplateSpec, ServiceSpec},
        networking::v1::{
            HTTPIngressPath, HTTPIngressRuleValue, IngressBackend, IngressRule,
            IngressServiceBackend, IngressSpec,
        },
    },
    Deployment, DynamicObject, Ingress, ObjectMeta, Service, TypeMeta,
};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::LabelSelector;
use maplit::btreemap;
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;


fn labels(map: BTreeMap<&str, &str>) -> BTreeMap<String, String> {
    map.into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

fn mk_meta(name: &str) -> ObjectMeta {
    ObjectMeta {
        namespace: Some("ns-0".to_string()),
        name: Some(name.to_string()),
        ..Default::default()
    }
}

pub(crate) fn mk_deployment(name: &str, selector: BTreeMap<&str, &str>) -> Deployment {
    let selector = labels(selector);
    Deployment {
        metadata: mk_meta(name),
        spec: Some(DeploymentSpec {
            selector: LabelSelector {
                match_labels: Some(selector.clone()),
                ..Default::default()
            },
            template: PodTemplateSpec {
                metadata: Some(ObjectMeta {
                    labels: Some(selector),
                    ..Default::default()
                }),
                spec: Some(PodSpec {
                    containers: vec![Container {
                        name: "main".to_string(),
                        image: Some(format!("{name}:1.0")),
                        ..Default::default()
                    }],
                    ..Default::default()
                }),
            },
            ..Default::default()
        }),
        status: Some(K8sDeploymentStatus {
            replicas: Some(1),
            available_replicas: Some(1),
            ..Default::default()
        }),
    }
}

pub(crate) fn mk_service(name: &str, selector: BTreeMap<&str, &str>) -> Service {
    Service {
        metadata: mk_meta(name),
        spec: Some(ServiceSpec {
            selector: Some(labels(selector)),
            ..Default::default()
        }),
        status: None,
    }
}

/// Builds an ingress from `(host, [(path, backend service)])` rules.
pub(crate) fn mk_ingress(
    name: &str,
    annotations: BTreeMap<&str, &str>,
    rules: Vec<(&str, Vec<(&str, &str)>)>,
) -> Ingress {
    let rules = rules
        .into_iter()
        .map(|(host, paths)| IngressRule {
            host: Some(host.to_string()),
            http: Some(HTTPIngressRuleValue {
                paths: paths
                    .into_iter()
                    .map(|(path, backend)| HTTPIngressPath {
                        path: Some(path.to_string()),
                        path_type: "Prefix".to_string(),
                        backend: IngressBackend {
                            service: Some(IngressServiceBackend {
                                name: backend.to_string(),
                                port: None,
                            }),
                            resource: None,
                        },
                    })
                    .collect(),
            }),
        })
        .collect();

    Ingress {
        metadata: ObjectMeta {
            annotations: Some(labels(annotations)),
            ..mk_meta(name)
        },
        spec: Some(IngressSpec {
            rules: Some(rules),
            ..Default::default()
        }),
        status: None,
    }
}

pub(crate) fn dynamic<K: serde::Serialize>(obj: &K) -> DynamicObject {
    serde_json::from_value(serde_json::to_value(obj).unwrap()).unwrap()
}

fn mk_namespace(
    deployments: Vec<Deployment>,
    services: Vec<Service>,
    ingresses: Vec<Ingress>,
) -> NamespaceHandle {
    let ns = NamespaceHandle::new("ns-0");
    for d in &deployments {
        ns.deployments.write().apply(dynamic(d));
    }
    for s in &services {
        ns.services.write().apply(dynamic(s));
    }
    for i in &ingresses {
        ns.ingresses.write().apply(dynamic(i));
    }
    ns
}

fn config_map(name: &str) -> DynamicObject {
    let mut obj = dynamic(&serde_json::json!({
        "metadata": { "name": name, "namespace": "ns-0" },
        "data": { "key": "value" },
    }));
    obj.types = Some(TypeMeta {
        api_version: "v1".to_string(),
        kind: "ConfigMap".to_string(),
    });
    obj
}

fn ingress_names(ep: &ApplicationEndpoint) -> Vec<(&str, &str)> {
    ep.ingresses
        .iter()
        .map(|i| (i.host.as_str(), i.path.as_str()))
        .collect()
}

#[test]
fn web_scenario() {
    let web = {
        let mut d = mk_deployment("web", btreemap! { "app" => "web" });
        d.status = Some(K8sDeploymentStatus {
            replicas: Some(3),
            available_replicas: Some(3),
            ..Default::default()
        });
        d
    };
    let ns = mk_namespace(
        vec![web],
        vec![mk_service("web-svc", btreemap! { "app" => "web" })],
        vec![mk_ingress(
            "web-ing",
            btreemap! { "nginx.ingress.kubernetes.io/grpc-backend" => "true" },
            vec![("example.com", vec![("/", "web-svc")])],
        )],
    );

    assert_eq!(
        ns.endpoints().unwrap(),
        vec![ApplicationEndpoint {
            name: "web".to_string(),
            ingresses: vec![ApplicationIngress {
                host: "example.com".to_string(),
                path: "/".to_string(),
                looks_like_grpc: true,
            }],
            deployment_annotations: BTreeMap::new(),
            deployment_status: DeploymentStatus {
                available_replicas: 3,
                replicas: 3,
            },
            images: vec!["web:1.0".to_string()],
        }]
    );
}

#[test]
fn deployment_without_services() {
    let ns = mk_namespace(
        vec![mk_deployment("worker", btreemap! { "app" => "worker" })],
        vec![mk_service("web-svc", btreemap! { "app" => "web" })],
        vec![],
    );

    let endpoints = ns.endpoints().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(endpoints[0].name, "worker");
    assert!(endpoints[0].ingresses.is_empty());
}

#[test]
fn one_endpoint_per_service_without_ingress() {
    let ns = mk_namespace(
        vec![mk_deployment("web", btreemap! { "app" => "web" })],
        vec![
            mk_service("web-a", btreemap! { "app" => "web" }),
            mk_service("web-b", btreemap! { "app" => "web" }),
            mk_service("web-c", btreemap! { "app" => "web" }),
        ],
        vec![mk_ingress(
            "other",
            btreemap! {},
            vec![("other.example.com", vec![("/", "other-svc")])],
        )],
    );

    let endpoints = ns.endpoints().unwrap();
    assert_eq!(endpoints.len(), 3);
    for ep in &endpoints {
        assert_eq!(ep.name, "web");
        assert!(ep.ingresses.is_empty());
    }
}

#[test]
fn ingresses_do_not_leak_across_services() {
    let ns = mk_namespace(
        vec![mk_deployment("web", btreemap! { "app" => "web" })],
        vec![
            mk_service("web-a", btreemap! { "app" => "web" }),
            mk_service("web-b", btreemap! { "app" => "web" }),
            mk_service("web-c", btreemap! { "app" => "web" }),
        ],
        vec![
            mk_ingress(
                "ing-a",
                btreemap! {},
                vec![("a.example.com", vec![("/", "web-a")])],
            ),
            mk_ingress(
                "ing-c",
                btreemap! {},
                vec![("c.example.com", vec![("/c", "web-c")])],
            ),
        ],
    );

    let endpoints = ns.endpoints().unwrap();
    assert_eq!(
        endpoints.iter().map(ingress_names).collect::<Vec<_>>(),
        vec![
            vec![("a.example.com", "/")],
            vec![],
            vec![("c.example.com", "/c")],
        ]
    );
}

#[test]
fn related_ingress_contributes_all_paths() {
    // Once an ingress routes to the service through any path, every (rule, path) pair of the
    // ingress is reported, including those routed elsewhere.
    let ns = mk_namespace(
        vec![mk_deployment("web", btreemap! { "app" => "web" })],
        vec![mk_service("web-svc", btreemap! { "app" => "web" })],
        vec![
            mk_ingress(
                "ing-0",
                btreemap! {},
                vec![
                    ("a.example.com", vec![("/", "web-svc"), ("/static", "web-svc")]),
                    ("b.example.com", vec![("/api", "api-svc")]),
                ],
            ),
            mk_ingress(
                "ing-1",
                btreemap! { "grpc-backend" => "true" },
                vec![("grpc.example.com", vec![("/", "web-svc")])],
            ),
        ],
    );

    let endpoints = ns.endpoints().unwrap();
    assert_eq!(endpoints.len(), 1);
    assert_eq!(
        endpoints[0].ingresses,
        vec![
            ApplicationIngress {
                host: "a.example.com".to_string(),
                path: "/".to_string(),
                looks_like_grpc: false,
            },
            ApplicationIngress {
                host: "a.example.com".to_string(),
                path: "/static".to_string(),
                looks_like_grpc: false,
            },
            ApplicationIngress {
                host: "b.example.com".to_string(),
                path: "/api".to_string(),
                looks_like_grpc: false,
            },
            ApplicationIngress {
                host: "grpc.example.com".to_string(),
                path: "/".to_string(),
                looks_like_grpc: true,
            },
        ]
    );
}

#[test]
fn grpc_detection_is_exact() {
    for (value, expected) in [("true", true), ("True", false), ("TRUE", false), ("yes", false)] {
        let ns = mk_namespace(
            vec![mk_deployment("web", btreemap! { "app" => "web" })],
            vec![mk_service("web-svc", btreemap! { "app" => "web" })],
            vec![mk_ingress(
                "web-ing",
                btreemap! { "nginx.ingress.kubernetes.io/grpc-backend" => value },
                vec![("example.com", vec![("/", "web-svc"), ("/v2", "web-svc")])],
            )],
        );

        let endpoints = ns.endpoints().unwrap();
        assert!(
            endpoints[0]
                .ingresses
                .iter()
                .all(|i| i.looks_like_grpc == expected),
            "{value}"
        );
    }
}

#[test]
fn deployment_fields_are_copied_to_every_endpoint() {
    let web = {
        let mut d = mk_deployment("web", btreemap! { "app" => "web" });
        let template = &mut d.spec.as_mut().unwrap().template;
        template.metadata.as_mut().unwrap().annotations =
            Some(labels(btreemap! { "owner" => "edge" }));
        template
            .spec
            .as_mut()
            .unwrap()
            .containers
            .push(Container {
                name: "sidecar".to_string(),
                image: Some("proxy:2.1".to_string()),
                ..Default::default()
            });
        d.status = Some(K8sDeploymentStatus {
            replicas: Some(4),
            available_replicas: Some(2),
            ..Default::default()
        });
        d
    };
    let ns = mk_namespace(
        vec![web],
        vec![
            mk_service("web-a", btreemap! { "app" => "web" }),
            mk_service("web-b", btreemap! { "app" => "web" }),
        ],
        vec![mk_ingress(
            "ing-a",
            btreemap! {},
            vec![("a.example.com", vec![("/", "web-a")])],
        )],
    );

    let endpoints = ns.endpoints().unwrap();
    assert_eq!(endpoints.len(), 2);
    for ep in &endpoints {
        assert_eq!(ep.images, vec!["web:1.0".to_string(), "proxy:2.1".to_string()]);
        assert_eq!(
            ep.deployment_annotations,
            labels(btreemap! { "owner" => "edge" })
        );
        assert_eq!(
            ep.deployment_status,
            DeploymentStatus {
                available_replicas: 2,
                replicas: 4,
            }
        );
    }
}

#[test]
fn missing_status_reports_zero_replicas() {
    let mut d = mk_deployment("web", btreemap! { "app" => "web" });
    d.status = None;
    let ns = mk_namespace(vec![d], vec![], vec![]);

    assert_eq!(
        ns.endpoints().unwrap()[0].deployment_status,
        DeploymentStatus::default()
    );
}

#[test]
fn join_is_idempotent() {
    let ns = mk_namespace(
        vec![
            mk_deployment("web", btreemap! { "app" => "web" }),
            mk_deployment("api", btreemap! { "app" => "api" }),
            mk_deployment("worker", btreemap! { "app" => "worker" }),
        ],
        vec![
            mk_service("web-svc", btreemap! { "app" => "web" }),
            mk_service("api-svc", btreemap! { "app" => "api" }),
        ],
        vec![
            mk_ingress(
                "public",
                btreemap! {},
                vec![
                    ("example.com", vec![("/", "web-svc"), ("/api", "api-svc")]),
                    ("www.example.com", vec![("/", "web-svc")]),
                ],
            ),
            mk_ingress(
                "internal",
                btreemap! {},
                vec![("api.internal", vec![("/", "api-svc")])],
            ),
        ],
    );

    let first = ns.endpoints().unwrap();
    let second = ns.endpoints().unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first.iter().map(|ep| ep.name.as_str()).collect::<Vec<_>>(),
        vec!["api", "web", "worker"]
    );
}

#[test]
fn empty_namespace() {
    let ns = mk_namespace(vec![], vec![], vec![]);
    assert!(ns.endpoints().unwrap().is_empty());
}

#[test]
fn mismatched_deployment_fails() {
    let ns = mk_namespace(vec![], vec![], vec![]);
    ns.deployments.write().apply(config_map("settings"));

    match ns.endpoints() {
        Err(JoinError::TypeMismatch(e)) => {
            assert_eq!(e.expected, "Deployment");
            assert_eq!(e.found, "ConfigMap");
            assert_eq!(e.name, "settings");
        }
        res => panic!("unexpected result: {res:?}"),
    }
}

#[test]
fn mismatched_service_fails() {
    let ns = mk_namespace(
        vec![mk_deployment("web", btreemap! { "app" => "web" })],
        vec![mk_service("web-svc", btreemap! { "app" => "web" })],
        vec![],
    );
    ns.services.write().apply(config_map("settings"));

    match ns.endpoints() {
        Err(JoinError::RelationLookup {
            relation, source, ..
        }) => {
            assert_eq!(relation, "services");
            assert_eq!(source.expected, "Service");
        }
        res => panic!("unexpected result: {res:?}"),
    }
}

#[test]
fn mismatched_ingress_fails_when_resolved() {
    let ns = mk_namespace(
        vec![mk_deployment("web", btreemap! { "app" => "web" })],
        vec![],
        vec![],
    );
    ns.ingresses.write().apply(config_map("settings"));

    // Without a related service, ingresses are never consulted.
    assert_eq!(ns.endpoints().unwrap().len(), 1);

    ns.services
        .write()
        .apply(dynamic(&mk_service("web-svc", btreemap! { "app" => "web" })));
    let err = ns.endpoints().unwrap_err();
    assert!(
        matches!(err, JoinError::RelationLookup { relation: "ingresses", .. }),
        "{err:?}"
    );
    assert_eq!(err.type_mismatch().expected, "Ingress");
}

#[test]
fn registry_lookup() {
    let registry = Registry::from_iter([
        mk_namespace(
            vec![mk_deployment("web", btreemap! { "app" => "web" })],
            vec![],
            vec![],
        ),
        NamespaceHandle::new("default"),
    ]);

    assert_eq!(registry.namespaces(), vec!["default", "ns-0"]);
    assert_eq!(registry.endpoints("ns-0").unwrap().len(), 1);
    assert!(registry.endpoints("default").unwrap().is_empty());
    assert!(matches!(
        registry.endpoints("kube-system"),
        Err(LookupError::NotAvailable(ns)) if ns == "kube-system"
    ));

    registry
        .get("ns-0")
        .unwrap()
        .services
        .write()
        .apply(config_map("settings"));
    assert!(matches!(
        registry.endpoints("ns-0"),
        Err(LookupError::Join { namespace, .. }) if namespace == "ns-0"
    ));
}

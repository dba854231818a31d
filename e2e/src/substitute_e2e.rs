use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::{
    api::{Api, DeleteParams, ListParams},
    discovery::Discovery,
    Client,
};
use std::time::{Duration, Instant};
use substitute_controller::common::{identity_label_selector, substitute_name};
use substitute_controller::crds::{EffectiveHorizontalPodAutoscaler, Substitute};
use tokio::time::sleep;
use tracing::*;

use crate::common::*;

pub fn deployment(name: &str, replicas: i32) -> String {
    format!(
        "
    apiVersion: apps/v1
    kind: Deployment
    metadata:
      name: {name}
      namespace: default
    spec:
      replicas: {replicas}
      selector:
        matchLabels:
          app: {name}
      template:
        metadata:
          labels:
            app: {name}
        spec:
          containers:
          - name: nginx
            image: nginx:1.25
    "
    )
}

pub fn effective_hpa() -> String {
    "
    apiVersion: autoscaling.crane.io/v1alpha1
    kind: EffectiveHorizontalPodAutoscaler
    metadata:
      name: web
      namespace: default
    spec:
      scaleTargetRef:
        apiVersion: apps/v1
        kind: Deployment
        name: web
      minReplicas: 1
      maxReplicas: 5
    "
    .to_string()
}

async fn wait_for_substitute<F>(
    client: Client,
    uid: &str,
    timeout: Duration,
    accept: F,
) -> Result<Option<Substitute>, Error>
where
    F: Fn(&[Substitute]) -> Result<bool, Error>,
{
    let subs_api: Api<Substitute> = Api::namespaced(client, "default");
    let lp = ListParams::default().labels(&identity_label_selector(uid));
    let start = Instant::now();
    loop {
        sleep(Duration::from_secs(5)).await;
        if start.elapsed() > timeout {
            return Err(Error::Timeout);
        }
        match subs_api.list(&lp).await {
            Err(e) => {
                info!("List substitutes failed with error {}.", e);
                continue;
            }
            Ok(list) => {
                if accept(&list.items)? {
                    return Ok(list.items.into_iter().next());
                }
            }
        }
    }
}

pub async fn desired_state_test(client: Client, uid: &str) -> Result<(), Error> {
    wait_for_substitute(client, uid, Duration::from_secs(120), |items| {
        if items.is_empty() {
            info!("Substitute not created yet.");
            return Ok(false);
        }
        if items.len() > 1 {
            return Err(Error::SubstituteFailed(format!(
                "{} substitutes carry the same identity label",
                items.len()
            )));
        }
        let substitute = &items[0];
        if substitute.metadata.name != Some(substitute_name("web")) {
            return Err(Error::SubstituteFailed("unexpected name".to_string()));
        }
        if substitute.spec.substitute_target_ref.name != "web" || substitute.spec.replicas != 2 {
            return Err(Error::SubstituteFailed(format!(
                "unexpected spec {:?}",
                substitute.spec
            )));
        }
        Ok(true)
    })
    .await?;
    info!("Desired state test passed.");
    Ok(())
}

pub async fn retarget_test(client: Client, uid: &str) -> Result<(), Error> {
    run_command(
        "kubectl",
        vec![
            "patch",
            "ehpa",
            "web",
            "--type=json",
            "-p",
            "[{\"op\": \"replace\", \"path\": \"/spec/scaleTargetRef/name\", \"value\": \"web-canary\"}]",
        ],
        "failed to patch EffectiveHorizontalPodAutoscaler",
    );

    wait_for_substitute(client, uid, Duration::from_secs(120), |items| {
        let substitute = match items.first() {
            Some(substitute) => substitute,
            None => return Err(Error::SubstituteFailed("substitute vanished".to_string())),
        };
        if substitute.spec.substitute_target_ref.name != "web-canary" {
            info!("Substitute still targets {}.", substitute.spec.substitute_target_ref.name);
            return Ok(false);
        }
        // The canary runs one replica; the Substitute keeps the count it was created with.
        if substitute.spec.replicas != 2 {
            return Err(Error::SubstituteFailed(format!(
                "replicas changed to {}",
                substitute.spec.replicas
            )));
        }
        Ok(true)
    })
    .await?;
    info!("Retarget test passed.");
    Ok(())
}

pub async fn garbage_collection_test(client: Client, uid: &str) -> Result<(), Error> {
    let ehpa_api: Api<EffectiveHorizontalPodAutoscaler> = Api::namespaced(client.clone(), "default");
    ehpa_api.delete("web", &DeleteParams::foreground()).await?;

    wait_for_substitute(client, uid, Duration::from_secs(120), |items| {
        if !items.is_empty() {
            info!("Substitute not collected yet.");
        }
        Ok(items.is_empty())
    })
    .await?;
    info!("Garbage collection test passed.");
    Ok(())
}

pub async fn substitute_e2e_test() -> Result<(), Error> {
    // check if the CRDs are already registered
    let client = Client::try_default().await?;
    let crd_api: Api<CustomResourceDefinition> = Api::all(client.clone());
    for crd in [
        "effectivehorizontalpodautoscalers.autoscaling.crane.io",
        "substitutes.autoscaling.crane.io",
    ] {
        if let Err(e) = crd_api.get(crd).await {
            error!("No CRD {} found, create one before run the e2e test.", crd);
            return Err(Error::CRDGetFailed(e));
        }
    }
    info!("CRDs found, continue to run the e2e test.");

    let discovery = Discovery::new(client.clone()).run().await?;
    apply(deployment("web", 2), client.clone(), &discovery).await?;
    apply(deployment("web-canary", 1), client.clone(), &discovery).await?;
    let ehpa_name = apply(effective_hpa(), client.clone(), &discovery).await?;

    let ehpa_api: Api<EffectiveHorizontalPodAutoscaler> = Api::namespaced(client.clone(), "default");
    let ehpa = ehpa_api.get(&ehpa_name).await?;
    let uid = ehpa.metadata.uid.unwrap_or_default();

    desired_state_test(client.clone(), &uid).await?;
    retarget_test(client.clone(), &uid).await?;
    garbage_collection_test(client.clone(), &uid).await?;

    info!("E2e test passed.");
    Ok(())
}

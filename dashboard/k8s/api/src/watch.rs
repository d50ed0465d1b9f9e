use crate::store::SharedStore;
use futures::prelude::*;
use kube::{
    api::Api,
    core::{ApiResource, DynamicObject},
    runtime::watcher::{self, Event},
    Client, ResourceExt,
};
use tokio::time;
use tracing::{debug, info};

/// Watches all objects of `resource` in namespace `ns`.
pub fn namespaced(
    client: Client,
    ns: &str,
    resource: &ApiResource,
) -> impl Stream<Item = watcher::Result<Event<DynamicObject>>> + Send + 'static {
    let api = Api::<DynamicObject>::namespaced_with(client, ns, resource);
    watcher::watcher(api, watcher::Config::default())
}

/// Applies watch events to a store until the event stream ends.
///
/// If the stream fails, log the error and sleep for 1s before polling for a reset event.
pub async fn run<S>(store: SharedStore, events: S)
where
    S: Stream<Item = watcher::Result<Event<DynamicObject>>>,
{
    futures::pin_mut!(events);

    // Holds the objects of a relist until it completes.
    let mut relist = None;
    while let Some(ev) = events.next().await {
        match ev {
            Ok(ev) => apply(&store, &mut relist, ev),
            Err(error) => {
                info!(%error, "Failed");
                time::sleep(time::Duration::from_secs(1)).await;
                info!("Restarting");
            }
        }
    }
    debug!("Watch stream ended");
}

fn apply(store: &SharedStore, relist: &mut Option<Vec<DynamicObject>>, ev: Event<DynamicObject>) {
    match ev {
        Event::Apply(obj) => store.write().apply(obj),
        Event::Delete(obj) => store.write().delete(&obj.name_any()),
        Event::Init => *relist = Some(Vec::new()),
        Event::InitApply(obj) => relist.get_or_insert_with(Vec::new).push(obj),
        Event::InitDone => {
            let objs = relist.take().unwrap_or_default();
            debug!(objects = objs.len(), "Relisted");
            store.write().reset(objs);
        }
    }
}

use crate::beem_api::BeemBox;

pub trait MetricCollector {
    fn publish(&mut self, boxes: &[BeemBox]);

    fn disconnect(&mut self);
}

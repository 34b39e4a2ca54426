use crate::domain::model::{AgencyKey, Offer, Trip};
use crate::domain::ports::AgencyDirectory;

/// Builds the offer from already validated trips.
///
/// Input order is kept inside each group. Trips with no agency id, or an id the
/// directory does not know, go to [`AgencyKey::Unknown`].
pub fn group_trips<I>(trips: I, directory: &dyn AgencyDirectory) -> Offer
where
    I: IntoIterator<Item = Trip>,
{
    let mut offer = Offer::new();
    let mut unknown = 0usize;

    for trip in trips {
        let key = AgencyKey::from(trip.agency_id().and_then(|id| directory.lookup_by_id(id)));
        if key == AgencyKey::Unknown {
            unknown += 1;
        }
        offer.push(key, trip);
    }

    if unknown > 0 {
        tracing::debug!("{} trips grouped under unknown agency", unknown);
    }
    tracing::debug!(
        "Grouped {} trips into {} agencies",
        offer.trip_count(),
        offer.len()
    );

    offer
}

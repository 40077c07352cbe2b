use anyhow::Result;

use super::{Context, OutputOptions, render};

pub fn execute(ctx: &Context, options: OutputOptions) -> Result<()> {
   if options.json {
      return render::trips_json(ctx.catalog.trips(), None);
   }

   let trips = ctx.catalog.trips();
   render::header(&format!("{} trips", trips.len()), options);
   render::trips(trips, options);
   Ok(())
}

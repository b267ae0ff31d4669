mod test_queued_sends_flush_in_order;

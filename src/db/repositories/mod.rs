mod time_records;
